//! Owned request value handed to the interception hook.
//!
//! Host adapters convert whatever their client sends into a [`Request`]; the
//! matching engine only reads from it. Field extraction (URL without query,
//! decoded query parameters, form and JSON bodies) lives here so that every
//! matcher sees the same view of a request.

use std::borrow::Cow;

use bytes::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Method, Uri};
use serde_json::{Map, Value};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// An intercepted HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Create a request with no headers and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add (or replace) a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the body, leaving headers untouched.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body along with a JSON content type.
    pub fn with_json(mut self, value: &Value) -> Self {
        self.body = Bytes::from(value.to_string());
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self
    }

    /// Set a form-encoded body along with the form content type.
    pub fn with_form(mut self, params: &[(&str, &str)]) -> Self {
        let encoded = params
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        self.body = Bytes::from(encoded);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Target URL without the query string.
    ///
    /// Absolute URIs render as `scheme://authority/path`; origin-form URIs
    /// render as the bare path.
    pub fn url(&self) -> String {
        match (self.uri.scheme_str(), self.uri.authority()) {
            (Some(scheme), Some(authority)) => {
                format!("{scheme}://{authority}{}", self.uri.path())
            }
            _ => self.uri.path().to_string(),
        }
    }

    /// Raw query string exactly as sent, percent-encoding included.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Query string decoded into a mapping.
    pub fn query_params(&self) -> Map<String, Value> {
        decode_form(self.query().unwrap_or_default())
    }

    /// Header value by case-insensitive name. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body decoded as `key=value&...`.
    pub fn form_params(&self) -> Map<String, Value> {
        decode_form(&self.body_text())
    }

    /// Body parsed as JSON, or `None` if it is empty or not valid JSON.
    pub fn json_body(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    /// Whether the request declares a JSON content type (`application/json`,
    /// `application/*+json`, ...).
    pub fn is_json(&self) -> bool {
        self.header(CONTENT_TYPE.as_str())
            .is_some_and(|content_type| content_type.to_ascii_lowercase().contains("json"))
    }

    /// Body parameters decoded according to the content type: JSON bodies are
    /// parsed as JSON, everything else as form-encoded.
    pub fn body_params(&self) -> Option<Value> {
        if self.is_json() {
            self.json_body()
        } else {
            Some(Value::Object(self.form_params()))
        }
    }
}

impl From<hyper::Request<Bytes>> for Request {
    fn from(request: hyper::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        }
    }
}

/// Decode a `key=value&...` string into a mapping of strings.
///
/// Keys ending in `[]` collect their values into an array; any other repeated
/// key keeps the last value. `+` decodes to a space.
pub fn decode_form(input: &str) -> Map<String, Value> {
    let mut params = Map::new();
    for pair in input.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        let value = Value::String(decode_component(value));

        match key.strip_suffix("[]") {
            Some(list_key) => {
                let entry = params
                    .entry(list_key.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match entry {
                    Value::Array(items) => items.push(value),
                    other => *other = Value::Array(vec![value]),
                }
            }
            None => {
                params.insert(key, value);
            }
        }
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}
