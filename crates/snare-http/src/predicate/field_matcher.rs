//! Field-specific matchers for the query string and the body.
//!
//! Both fields can be viewed in more than one way (raw text or decoded
//! mapping), so the matcher variant chosen decides how the field is extracted
//! before the inner [`Matcher`] runs.

use std::fmt;

use serde_json::Value;

use super::matcher::{BoxError, Matcher};
use crate::request::Request;

/// The request field a matcher was evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Method,
    Url,
    Query,
    Header(String),
    Body,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Method => f.write_str("method"),
            Field::Url => f.write_str("url"),
            Field::Query => f.write_str("query"),
            Field::Header(name) => write!(f, "header `{name}`"),
            Field::Body => f.write_str("body"),
        }
    }
}

/// Query string matching.
#[derive(Debug, Clone)]
pub enum QueryMatcher {
    /// Match against the decoded parameter mapping.
    Params(Matcher),
    /// Byte-for-byte comparison with the raw query string, no decoding.
    Raw(String),
}

impl QueryMatcher {
    pub fn matches(&self, request: &Request) -> Result<bool, BoxError> {
        match self {
            QueryMatcher::Params(matcher) => {
                let params = Value::Object(request.query_params());
                matcher.matches(Some(&params))
            }
            QueryMatcher::Raw(expected) => {
                Ok(request.query().unwrap_or_default() == expected.as_str())
            }
        }
    }
}

impl fmt::Display for QueryMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMatcher::Params(matcher) => write!(f, "query={matcher}"),
            QueryMatcher::Raw(raw) => write!(f, "query-string={raw:?}"),
        }
    }
}

/// Body matching, by the view of the body the matcher sees.
#[derive(Debug, Clone)]
pub enum BodyMatcher {
    /// The body as a string.
    Raw(Matcher),
    /// The body decoded as `key=value&...`.
    Form(Matcher),
    /// The body parsed as JSON. Unparseable bodies are absent.
    Json(Matcher),
    /// JSON when the request has a JSON content type, form-decoded otherwise.
    Params(Matcher),
}

impl BodyMatcher {
    pub fn matches(&self, request: &Request) -> Result<bool, BoxError> {
        match self {
            BodyMatcher::Raw(matcher) => {
                let body = Value::String(request.body_text().into_owned());
                matcher.matches(Some(&body))
            }
            BodyMatcher::Form(matcher) => {
                let params = Value::Object(request.form_params());
                matcher.matches(Some(&params))
            }
            BodyMatcher::Json(matcher) => matcher.matches(request.json_body().as_ref()),
            BodyMatcher::Params(matcher) => matcher.matches(request.body_params().as_ref()),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        match self {
            BodyMatcher::Raw(matcher)
            | BodyMatcher::Form(matcher)
            | BodyMatcher::Json(matcher)
            | BodyMatcher::Params(matcher) => matcher,
        }
    }
}

impl fmt::Display for BodyMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            BodyMatcher::Raw(_) => "body",
            BodyMatcher::Form(_) => "form",
            BodyMatcher::Json(_) => "json",
            BodyMatcher::Params(_) => "body-params",
        };
        write!(f, "{kind}={}", self.matcher())
    }
}
