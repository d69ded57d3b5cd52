//! Expectations and the fluent builder used to configure them.

use std::sync::Arc;

use hyper::StatusCode;
use serde::Serialize;
use tracing::warn;

use super::core::Shared;
use super::types::{Cardinality, MockError, NCalls};
use crate::predicate::{BodyMatcher, Matcher, QueryMatcher, RequestPredicate};
use crate::request::Request;
use crate::response::{Response, ResponseSource};

/// One registered request expectation.
#[derive(Debug, Clone, Default)]
pub struct Expectation {
    pub(crate) predicate: RequestPredicate,
    pub(crate) cardinality: Cardinality,
    pub(crate) response: ResponseSource,
    pub(crate) calls: usize,
}

impl Expectation {
    pub fn predicate(&self) -> &RequestPredicate {
        &self.predicate
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Number of requests matched so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn has_capacity(&self) -> bool {
        self.cardinality.has_capacity(self.calls)
    }

    pub fn is_satisfied(&self) -> bool {
        self.cardinality.is_satisfied(self.calls)
    }

    /// Whether the request satisfies every field matcher and the expectation
    /// still has capacity. Exhausted expectations never run their matchers.
    pub fn matches(&self, request: &Request) -> Result<bool, MockError> {
        if !self.has_capacity() {
            return Ok(false);
        }
        self.predicate.matches(request)
    }

    pub(crate) fn describe(&self, index: usize) -> String {
        format!(
            "#{index} {} ({}, received {})",
            self.predicate,
            self.cardinality,
            NCalls(self.calls)
        )
    }
}

/// Fluent handle over a registered [`Expectation`].
///
/// Every call overwrites the corresponding setting. Configuration must finish
/// before the first request is matched against the expectation; changing it
/// afterwards panics.
pub struct ExpectationBuilder {
    shared: Arc<Shared>,
    index: usize,
    generation: u64,
}

impl ExpectationBuilder {
    pub(crate) fn new(shared: Arc<Shared>, index: usize, generation: u64) -> Self {
        Self {
            shared,
            index,
            generation,
        }
    }

    /// Position of the expectation in registration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn with_method(self, matcher: impl Into<Matcher>) -> Self {
        let matcher = matcher.into();
        self.configure(|expectation| expectation.predicate.method = Some(matcher))
    }

    /// Match the URL without its query string.
    pub fn with_url(self, matcher: impl Into<Matcher>) -> Self {
        let matcher = matcher.into();
        self.configure(|expectation| expectation.predicate.url = Some(matcher))
    }

    /// Match the decoded query parameters.
    pub fn with_query_params(self, matcher: impl Into<Matcher>) -> Self {
        let matcher = QueryMatcher::Params(matcher.into());
        self.configure(|expectation| expectation.predicate.query = Some(matcher))
    }

    /// Match the raw query string exactly, percent-encoding included.
    pub fn with_query_string(self, query: impl Into<String>) -> Self {
        let matcher = QueryMatcher::Raw(query.into());
        self.configure(|expectation| expectation.predicate.query = Some(matcher))
    }

    pub fn with_header(self, name: &str, matcher: impl Into<Matcher>) -> Self {
        let matcher = matcher.into();
        self.configure(|expectation| expectation.predicate.set_header(name, matcher))
    }

    /// Match the body as text.
    pub fn with_body(self, matcher: impl Into<Matcher>) -> Self {
        self.set_body(BodyMatcher::Raw(matcher.into()))
    }

    /// Match body parameters: JSON bodies are parsed as JSON, anything else as
    /// form-encoded.
    pub fn with_body_params(self, matcher: impl Into<Matcher>) -> Self {
        self.set_body(BodyMatcher::Params(matcher.into()))
    }

    /// Match the body decoded as form parameters, regardless of content type.
    pub fn with_form_params(self, matcher: impl Into<Matcher>) -> Self {
        self.set_body(BodyMatcher::Form(matcher.into()))
    }

    /// Match the body parsed as JSON, regardless of content type.
    pub fn with_json_body_params(self, matcher: impl Into<Matcher>) -> Self {
        self.set_body(BodyMatcher::Json(matcher.into()))
    }

    pub fn once(self) -> Self {
        self.times(1)
    }

    pub fn times(self, n: usize) -> Self {
        self.set_cardinality(Cardinality::Exactly(n))
    }

    pub fn zero_or_more_times(self) -> Self {
        self.set_cardinality(Cardinality::ZeroOrMore)
    }

    /// Respond with this exact response instance on every match.
    pub fn and_respond_with(self, response: impl Into<Arc<Response>>) -> Self {
        self.set_response(ResponseSource::Fixed(response.into()))
    }

    /// Respond with an empty body and the given status.
    pub fn and_respond_with_code(self, status: StatusCode) -> Self {
        self.set_response(ResponseSource::Status(status))
    }

    /// Respond with `data` as a JSON body and status 200.
    ///
    /// `data` is serialized on every match. If that fails, interception
    /// returns [`MockError::Json`] and the call is not counted.
    pub fn and_respond_with_json<T>(self, data: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.and_respond_with_json_status(data, StatusCode::OK)
    }

    pub fn and_respond_with_json_status<T>(self, data: T, status: StatusCode) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.set_response(ResponseSource::json(data, status))
    }

    /// Compute the response from the intercepted request.
    pub fn and_respond_using<F>(self, f: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.set_response(ResponseSource::computed(f))
    }

    fn set_body(self, matcher: BodyMatcher) -> Self {
        self.configure(|expectation| expectation.predicate.body = Some(matcher))
    }

    fn set_cardinality(self, cardinality: Cardinality) -> Self {
        self.configure(|expectation| expectation.cardinality = cardinality)
    }

    fn set_response(self, response: ResponseSource) -> Self {
        self.configure(|expectation| expectation.response = response)
    }

    fn configure(self, apply: impl FnOnce(&mut Expectation)) -> Self {
        let mut registry = self.shared.registry.lock();
        if registry.generation != self.generation {
            warn!(
                index = self.index,
                "Ignoring configuration of an expectation removed by reset"
            );
        } else if let Some(expectation) = registry.expectations.get_mut(self.index) {
            assert!(
                expectation.calls == 0,
                "expectation #{} was reconfigured after it matched {}",
                self.index,
                NCalls(expectation.calls)
            );
            apply(expectation);
        }
        drop(registry);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Method;
    use serde_json::json;

    fn get(uri: &str) -> Request {
        Request::new(Method::GET, uri.parse().unwrap())
    }

    #[test]
    fn test_default_expectation() {
        let expectation = Expectation::default();
        assert_eq!(expectation.cardinality(), Cardinality::Exactly(1));
        assert_eq!(expectation.calls(), 0);
        assert!(expectation.has_capacity());
        assert!(!expectation.is_satisfied());
        assert!(expectation.matches(&get("http://example.com/")).unwrap());
    }

    #[test]
    fn test_exhausted_expectation_skips_matchers() {
        let expectation = Expectation {
            predicate: RequestPredicate {
                url: Some(Matcher::predicate(|_| panic!("must not be evaluated"))),
                ..Default::default()
            },
            cardinality: Cardinality::Exactly(1),
            calls: 1,
            ..Default::default()
        };
        assert!(!expectation.matches(&get("http://example.com/")).unwrap());
        assert!(expectation.is_satisfied());
    }

    #[test]
    fn test_describe() {
        let expectation = Expectation {
            predicate: RequestPredicate {
                method: Some(Matcher::from("GET")),
                url: Some(Matcher::from("http://x/foo")),
                ..Default::default()
            },
            cardinality: Cardinality::Exactly(2),
            calls: 1,
            ..Default::default()
        };
        assert_eq!(
            expectation.describe(3),
            "#3 method=\"GET\" url=\"http://x/foo\" (exactly 2 calls, received 1 call)"
        );
    }

    #[test]
    fn test_zero_or_more_describe() {
        let expectation = Expectation {
            predicate: RequestPredicate {
                body: Some(BodyMatcher::Json(Matcher::contains(json!({"a": 1})))),
                ..Default::default()
            },
            cardinality: Cardinality::ZeroOrMore,
            ..Default::default()
        };
        assert_eq!(
            expectation.describe(0),
            "#0 json=contains {\"a\":1} (zero or more calls, received no calls)"
        );
    }
}
