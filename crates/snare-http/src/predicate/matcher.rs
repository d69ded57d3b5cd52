//! Value matchers evaluated against a single request field.
//!
//! Every field is viewed as a `serde_json::Value` (strings for method and URL,
//! objects for decoded query/form parameters, arbitrary JSON for JSON bodies),
//! so one matcher type covers all of them.

use std::fmt;
use std::sync::Arc;

use hyper::Method;
use regex::Regex;
use serde_json::{Map, Value};

/// Error type returned by fallible predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type PredicateFn = dyn Fn(&Value) -> Result<bool, BoxError> + Send + Sync;

/// A predicate over one request field.
#[derive(Clone)]
pub enum Matcher {
    /// Structural equality. Object key order is irrelevant, `null` is a value.
    Literal(Value),
    /// Every key/value of the expected object is present in the actual one.
    /// Strings match by substring, arrays by element membership.
    Contains(Value),
    /// Arbitrary logic. Absent fields are passed as `null`.
    Predicate(Arc<PredicateFn>),
    /// Matches anything, including absent fields.
    Any,
}

impl Matcher {
    pub fn literal(value: impl Into<Value>) -> Self {
        Matcher::Literal(value.into())
    }

    pub fn contains(subset: impl Into<Value>) -> Self {
        Matcher::Contains(subset.into())
    }

    pub fn any() -> Self {
        Matcher::Any
    }

    /// Infallible predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(move |value| Ok(f(value))))
    }

    /// Predicate whose errors abort interception instead of counting as a mismatch.
    pub fn try_predicate<F, E>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Matcher::Predicate(Arc::new(move |value| f(value).map_err(Into::into)))
    }

    /// Predicate matching string values against a regular expression.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Matcher::predicate(move |value| {
            value.as_str().is_some_and(|text| regex.is_match(text))
        }))
    }

    /// Evaluate against an extracted field value (`None` when the field is absent).
    pub fn matches(&self, actual: Option<&Value>) -> Result<bool, BoxError> {
        match self {
            Matcher::Any => Ok(true),
            Matcher::Literal(expected) => Ok(actual == Some(expected)),
            Matcher::Contains(expected) => {
                Ok(actual.is_some_and(|actual| value_contains(actual, expected)))
            }
            Matcher::Predicate(f) => f(actual.unwrap_or(&Value::Null)),
        }
    }
}

fn value_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => expected
            .iter()
            .all(|(key, value)| actual.get(key) == Some(value)),
        (Value::String(actual), Value::String(expected)) => actual.contains(expected.as_str()),
        (Value::Array(actual), Value::Array(expected)) => {
            expected.iter().all(|item| actual.contains(item))
        }
        (actual, expected) => actual == expected,
    }
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        Matcher::Literal(value)
    }
}

impl From<Map<String, Value>> for Matcher {
    fn from(map: Map<String, Value>) -> Self {
        Matcher::Literal(Value::Object(map))
    }
}

impl From<&str> for Matcher {
    fn from(value: &str) -> Self {
        Matcher::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for Matcher {
    fn from(value: String) -> Self {
        Matcher::Literal(Value::String(value))
    }
}

impl From<Method> for Matcher {
    fn from(method: Method) -> Self {
        Matcher::Literal(Value::String(method.as_str().to_string()))
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(value) => write!(f, "{value}"),
            Matcher::Contains(value) => write!(f, "contains {value}"),
            Matcher::Predicate(_) => f.write_str("<predicate>"),
            Matcher::Any => f.write_str("<any>"),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Matcher::Contains(value) => f.debug_tuple("Contains").field(value).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(<fn>)"),
            Matcher::Any => f.write_str("Any"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_object_is_order_insensitive() {
        let matcher = Matcher::literal(json!({"faz": "baz", "foo": "bar"}));
        assert!(matcher
            .matches(Some(&json!({"foo": "bar", "faz": "baz"})))
            .unwrap());
        assert!(!matcher.matches(Some(&json!({"foo": "bar"}))).unwrap());
        assert!(!matcher
            .matches(Some(&json!({"foo": "bar", "faz": "baz", "extra": 1})))
            .unwrap());
    }

    #[test]
    fn test_literal_null_is_not_absent() {
        let matcher = Matcher::literal(json!({"faz": "baz", "nullA": null, "nullB": null}));
        assert!(matcher
            .matches(Some(&json!({"nullB": null, "faz": "baz", "nullA": null})))
            .unwrap());
        assert!(!matcher
            .matches(Some(&json!({"faz": "baz", "nullA": null})))
            .unwrap());

        assert!(!Matcher::literal(Value::Null).matches(None).unwrap());
    }

    #[test]
    fn test_contains_allows_extra_keys() {
        let matcher = Matcher::contains(json!({"foo": "bar"}));
        assert!(matcher
            .matches(Some(&json!({"foo": "bar", "faz": "baz"})))
            .unwrap());
        assert!(!matcher
            .matches(Some(&json!({"foo": "shablooey", "faz": "baz"})))
            .unwrap());
        assert!(!matcher.matches(None).unwrap());
    }

    #[test]
    fn test_contains_strings_and_arrays() {
        assert!(Matcher::contains("/users")
            .matches(Some(&json!("http://example.com/users/1")))
            .unwrap());
        assert!(Matcher::contains(json!(["b"]))
            .matches(Some(&json!(["a", "b", "c"])))
            .unwrap());
        assert!(!Matcher::contains(json!(["z"]))
            .matches(Some(&json!(["a", "b"])))
            .unwrap());
    }

    #[test]
    fn test_any_matches_absent() {
        assert!(Matcher::any().matches(None).unwrap());
        assert!(Matcher::any().matches(Some(&json!(42))).unwrap());
    }

    #[test]
    fn test_predicate_receives_null_for_absent() {
        let matcher = Matcher::predicate(|value| value.is_null());
        assert!(matcher.matches(None).unwrap());
        assert!(!matcher.matches(Some(&json!("x"))).unwrap());
    }

    #[test]
    fn test_try_predicate_propagates_errors() {
        let matcher = Matcher::try_predicate(|value: &Value| -> Result<bool, String> {
            value
                .as_str()
                .map(|s| s.len() == 3)
                .ok_or_else(|| "expected a string".to_string())
        });
        assert!(matcher.matches(Some(&json!("PUT"))).unwrap());
        let err = matcher.matches(Some(&json!(7))).unwrap_err();
        assert_eq!(err.to_string(), "expected a string");
    }

    #[test]
    fn test_regex_matcher() {
        let matcher = Matcher::regex("foo$").unwrap();
        assert!(matcher
            .matches(Some(&json!("http://www.example.com/foo")))
            .unwrap());
        assert!(!matcher
            .matches(Some(&json!("http://www.example.com/shablooey")))
            .unwrap());
        assert!(Matcher::regex("(unclosed").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Matcher::from("GET").to_string(), "\"GET\"");
        assert_eq!(
            Matcher::contains(json!({"a": 1})).to_string(),
            "contains {\"a\":1}"
        );
        assert_eq!(Matcher::predicate(|_| true).to_string(), "<predicate>");
        assert_eq!(Matcher::any().to_string(), "<any>");
    }
}
