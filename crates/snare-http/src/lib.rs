//! Expectation-driven test double for HTTP clients.
//!
//! A [`Mock`] holds an ordered queue of expectations. Each outgoing request a
//! client under test issues is handed to the mock's interception hook, which
//! returns the canned response of the first matching expectation that still
//! has capacity, or fails with [`MockError::UnexpectedRequest`]. At the end of
//! the test, [`Mock::verify`] reports every expectation that was not invoked
//! the declared number of times.
//!
//! # Example
//!
//! ```
//! use hyper::Method;
//! use serde_json::json;
//! use snare_http::{Matcher, Mock, Request};
//!
//! let mock = Mock::new();
//! mock.should_receive_request()
//!     .times(2)
//!     .with_method("POST")
//!     .with_url("http://api.example.com/events")
//!     .with_json_body_params(Matcher::contains(json!({"kind": "click"})))
//!     .and_respond_with_json_status(json!({"ok": true}), hyper::StatusCode::CREATED);
//!
//! let handler = mock.handler();
//! for _ in 0..2 {
//!     let request = Request::new(Method::POST, "http://api.example.com/events".parse().unwrap())
//!         .with_json(&json!({"kind": "click", "x": 10}));
//!     let response = handler.handle(request).unwrap();
//!     assert_eq!(response.status(), 201);
//! }
//!
//! mock.verify().unwrap();
//! ```

pub mod config;
pub mod mock;
pub mod predicate;
pub mod request;
pub mod response;

pub use config::MockConfig;
pub use mock::{
    Cardinality, Expectation, ExpectationBuilder, Handler, Mock, MockError, UnexpectedRequest,
    VerificationFailure, Violation,
};
pub use predicate::{BodyMatcher, BoxError, Field, Matcher, QueryMatcher, RequestPredicate};
pub use request::Request;
pub use response::{Response, ResponseSource};
