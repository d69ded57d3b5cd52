//! Request matching for expectations.
//!
//! # Module Structure
//!
//! - `matcher` - The value [`Matcher`] (literal, contains, predicate, any)
//! - `field_matcher` - Query and body matchers that pick how a field is decoded
//! - `request` - [`RequestPredicate`], every field matcher of one expectation

mod field_matcher;
mod matcher;
mod request;

pub use field_matcher::{BodyMatcher, Field, QueryMatcher};
pub use matcher::{BoxError, Matcher};
pub use request::RequestPredicate;
