//! Core Mock registry: registration, interception and verification.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::HeaderValue;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::expectation::{Expectation, ExpectationBuilder};
use super::types::{MockError, UnexpectedRequest, VerificationFailure, Violation};
use crate::config::MockConfig;
use crate::request::Request;
use crate::response::Response;

/// Mutable registry state, guarded by the mock's lock.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) expectations: Vec<Expectation>,
    pub(crate) journal: Vec<Request>,
    /// Bumped by `reset` so stale builders stop touching new expectations.
    pub(crate) generation: u64,
}

pub(crate) struct Shared {
    pub(crate) registry: Mutex<Registry>,
    config: MockConfig,
    json_content_type: HeaderValue,
}

impl Shared {
    fn intercept(&self, request: Request) -> Result<Arc<Response>, MockError> {
        let mut registry = self.registry.lock();
        if self.config.record_requests {
            registry.journal.push(request.clone());
        }

        let mut selected = None;
        for (index, expectation) in registry.expectations.iter().enumerate() {
            if expectation.matches(&request)? {
                selected = Some(index);
                break;
            }
        }

        let Some(index) = selected else {
            let error = self.unexpected_request(&request, &registry.expectations);
            warn!("{}", error);
            return Err(error.into());
        };

        // a response that fails to encode does not consume the call
        let expectation = &mut registry.expectations[index];
        let response = expectation
            .response
            .produce(&request, &self.json_content_type)?;
        expectation.calls += 1;
        debug!(
            index,
            calls = expectation.calls,
            method = %request.method(),
            url = %request.url(),
            "Request matched expectation"
        );
        Ok(response)
    }

    fn verify(&self) -> Result<(), MockError> {
        let registry = self.registry.lock();
        let violations: Vec<Violation> = registry
            .expectations
            .iter()
            .enumerate()
            .filter(|(_, expectation)| !expectation.is_satisfied())
            .map(|(index, expectation)| Violation {
                index,
                description: expectation.predicate.to_string(),
                expected: expectation.cardinality,
                actual: expectation.calls,
            })
            .collect();

        if violations.is_empty() {
            info!(
                expectations = registry.expectations.len(),
                "All expectations satisfied"
            );
            return Ok(());
        }

        let failure = VerificationFailure { violations };
        warn!("{}", failure);
        Err(failure.into())
    }

    fn unexpected_request(
        &self,
        request: &Request,
        expectations: &[Expectation],
    ) -> UnexpectedRequest {
        let body = if request.body().is_empty() {
            None
        } else {
            let text = request.body_text();
            let limit = self.config.body_preview_limit;
            if text.chars().count() > limit {
                Some(format!("{}...", text.chars().take(limit).collect::<String>()))
            } else {
                Some(text.into_owned())
            }
        };

        let open_expectations = expectations
            .iter()
            .enumerate()
            .filter(|(_, expectation)| expectation.has_capacity())
            .map(|(index, expectation)| expectation.describe(index))
            .collect();

        UnexpectedRequest {
            method: request.method().to_string(),
            url: request.url(),
            query: request.query().map(str::to_string),
            body,
            open_expectations,
        }
    }
}

/// A registry of expectations for one test.
///
/// `Mock` is a cheap handle: clones share the same expectations, and the
/// [`Handler`] given to a client shares them as well.
///
/// ```
/// use snare_http::{Mock, Request};
/// use hyper::Method;
/// use serde_json::json;
///
/// let mock = Mock::new();
/// mock.should_receive_request()
///     .with_method("GET")
///     .with_url("http://www.example.com/users")
///     .and_respond_with_json(json!({"users": []}));
///
/// let request = Request::new(Method::GET, "http://www.example.com/users".parse().unwrap());
/// let response = mock.intercept(request).unwrap();
/// assert_eq!(response.status(), 200);
/// mock.verify().unwrap();
/// ```
#[derive(Clone)]
pub struct Mock {
    shared: Arc<Shared>,
}

impl Default for Mock {
    fn default() -> Self {
        Self::new()
    }
}

impl Mock {
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Build a mock from `config`. An unusable `json_content_type` is logged
    /// and replaced by `application/json`.
    pub fn with_config(config: MockConfig) -> Self {
        let json_content_type = config.json_content_type_header().unwrap_or_else(|error| {
            warn!(%error, "Invalid mock config, JSON responses use application/json");
            HeaderValue::from_static("application/json")
        });
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::default()),
                config,
                json_content_type,
            }),
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.shared.config
    }

    /// Register a new expectation at the end of the queue and return a
    /// builder for it. With no further configuration it matches any request
    /// exactly once and responds with an empty 200.
    pub fn should_receive_request(&self) -> ExpectationBuilder {
        let mut registry = self.shared.registry.lock();
        let index = registry.expectations.len();
        registry.expectations.push(Expectation::default());
        let generation = registry.generation;
        drop(registry);

        debug!(index, "Registered expectation");
        ExpectationBuilder::new(Arc::clone(&self.shared), index, generation)
    }

    /// Register an expectation whose method, URL, query parameters and body
    /// are copied from `template` as literal matchers.
    ///
    /// A JSON template body is matched as JSON, any other non-empty body as
    /// text. An empty template body leaves the body unconstrained.
    pub fn should_receive(&self, template: &Request) -> ExpectationBuilder {
        let builder = self
            .should_receive_request()
            .with_method(template.method().clone())
            .with_url(template.url());

        let builder = match template.query() {
            Some(_) => builder.with_query_params(template.query_params()),
            None => builder,
        };

        if template.body().is_empty() {
            return builder;
        }
        match template.json_body().filter(|_| template.is_json()) {
            Some(json) => builder.with_json_body_params(json),
            None => builder.with_body(template.body_text().into_owned()),
        }
    }

    /// Resolve a request against the registered expectations.
    ///
    /// The first expectation in registration order that matches and has
    /// capacity left is selected, its count incremented and its response
    /// produced. Fails immediately when nothing matches.
    pub fn intercept(&self, request: Request) -> Result<Arc<Response>, MockError> {
        self.shared.intercept(request)
    }

    /// The interception hook to hand to a client adapter.
    pub fn handler(&self) -> Handler {
        Handler {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Check every expectation's cardinality, reporting all violations at once.
    pub fn verify(&self) -> Result<(), MockError> {
        self.shared.verify()
    }

    /// Like [`verify`](Self::verify), but panics with the aggregated report.
    #[track_caller]
    pub fn assert_verified(&self) {
        if let Err(error) = self.verify() {
            panic!("{error}");
        }
    }

    /// Descriptions of the expectations that are not yet satisfied.
    pub fn pending(&self) -> Vec<String> {
        let registry = self.shared.registry.lock();
        registry
            .expectations
            .iter()
            .enumerate()
            .filter(|(_, expectation)| !expectation.is_satisfied())
            .map(|(index, expectation)| expectation.describe(index))
            .collect()
    }

    /// Every intercepted request, matched or not, in arrival order.
    pub fn received_requests(&self) -> Vec<Request> {
        self.shared.registry.lock().journal.clone()
    }

    pub fn expectation_count(&self) -> usize {
        self.shared.registry.lock().expectations.len()
    }

    /// Remove all expectations and recorded requests.
    pub fn reset(&self) {
        let mut registry = self.shared.registry.lock();
        registry.expectations.clear();
        registry.journal.clear();
        registry.generation += 1;
        debug!("Mock reset");
    }
}

// Runs when the last owner goes away, whether that is a `Mock`, a `Handler`
// or a builder.
impl Drop for Shared {
    fn drop(&mut self) {
        if !self.config.verify_on_drop || std::thread::panicking() {
            return;
        }
        if let Err(error) = self.verify() {
            panic!("{error}");
        }
    }
}

/// The interception hook, injected into whatever client abstraction a test uses.
#[derive(Clone)]
pub struct Handler {
    shared: Arc<Shared>,
}

impl Handler {
    pub fn handle(&self, request: Request) -> Result<Arc<Response>, MockError> {
        self.shared.intercept(request)
    }

    /// Handle a `hyper` request, returning a `hyper` response.
    pub fn handle_http(
        &self,
        request: hyper::Request<Bytes>,
    ) -> Result<hyper::Response<Full<Bytes>>, MockError> {
        let response = self.handle(Request::from(request))?;
        Ok(Response::clone(&response).into())
    }

    /// The hook as a plain closure.
    pub fn into_fn(self) -> impl Fn(Request) -> Result<Arc<Response>, MockError> + Send + Sync {
        move |request| self.handle(request)
    }
}
