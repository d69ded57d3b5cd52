//! Unified request predicate combining every field matcher of an expectation.

use std::fmt;

use serde_json::Value;

use super::field_matcher::{BodyMatcher, Field, QueryMatcher};
use super::matcher::{BoxError, Matcher};
use crate::mock::MockError;
use crate::request::Request;

/// The field matchers of one expectation. Unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct RequestPredicate {
    pub method: Option<Matcher>,
    pub url: Option<Matcher>,
    pub query: Option<QueryMatcher>,
    /// Header matchers keyed by lowercased name, all must match.
    pub headers: Vec<(String, Matcher)>,
    pub body: Option<BodyMatcher>,
}

impl RequestPredicate {
    /// Whether no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.method.is_none()
            && self.url.is_none()
            && self.query.is_none()
            && self.headers.is_empty()
            && self.body.is_none()
    }

    /// Set the matcher for a header, replacing any earlier one for the same name.
    pub fn set_header(&mut self, name: &str, matcher: Matcher) {
        let name = name.to_ascii_lowercase();
        match self.headers.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = matcher,
            None => self.headers.push((name, matcher)),
        }
    }

    /// Check every configured matcher against the request, in field order,
    /// stopping at the first mismatch.
    pub fn matches(&self, request: &Request) -> Result<bool, MockError> {
        if let Some(matcher) = &self.method {
            let method = Value::String(request.method().as_str().to_string());
            if !evaluate(Field::Method, matcher.matches(Some(&method)))? {
                return Ok(false);
            }
        }

        if let Some(matcher) = &self.url {
            let url = Value::String(request.url());
            if !evaluate(Field::Url, matcher.matches(Some(&url)))? {
                return Ok(false);
            }
        }

        if let Some(matcher) = &self.query {
            if !evaluate(Field::Query, matcher.matches(request))? {
                return Ok(false);
            }
        }

        for (name, matcher) in &self.headers {
            let value = request
                .header(name)
                .map(|value| Value::String(value.to_string()));
            if !evaluate(Field::Header(name.clone()), matcher.matches(value.as_ref()))? {
                return Ok(false);
            }
        }

        if let Some(matcher) = &self.body {
            if !evaluate(Field::Body, matcher.matches(request))? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

fn evaluate(field: Field, result: Result<bool, BoxError>) -> Result<bool, MockError> {
    result.map_err(|source| MockError::Predicate { field, source })
}

impl fmt::Display for RequestPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("any request");
        }

        let mut parts = Vec::new();
        if let Some(method) = &self.method {
            parts.push(format!("method={method}"));
        }
        if let Some(url) = &self.url {
            parts.push(format!("url={url}"));
        }
        if let Some(query) = &self.query {
            parts.push(query.to_string());
        }
        for (name, matcher) in &self.headers {
            parts.push(format!("{name}: {matcher}"));
        }
        if let Some(body) = &self.body {
            parts.push(body.to_string());
        }
        f.write_str(&parts.join(" "))
    }
}
