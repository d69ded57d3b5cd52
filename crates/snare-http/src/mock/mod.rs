//! Expectation registry, interception and verification.
//!
//! This module provides:
//! - `Mock`: the per-test registry of expectations
//! - `ExpectationBuilder`: fluent configuration of one expectation
//! - `Handler`: the interception hook given to client adapters
//!
//! ## Module Structure
//!
//! - `types`: Cardinality and error types
//! - `expectation`: Expectation state and its builder
//! - `core`: Mock registry, selection algorithm and verification

mod core;
mod expectation;
mod types;


pub use core::{Handler, Mock};
pub use expectation::{Expectation, ExpectationBuilder};
pub use types::{Cardinality, MockError, UnexpectedRequest, VerificationFailure, Violation};
