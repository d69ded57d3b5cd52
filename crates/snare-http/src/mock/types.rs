//! Cardinality and error types for the mock registry.

use std::fmt;

use crate::predicate::{BoxError, Field};

// ============================================================================
// Cardinality
// ============================================================================

/// How many times an expectation must be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly `n` matching requests. Further requests skip this expectation.
    Exactly(usize),
    /// Any number of matching requests, including none.
    ZeroOrMore,
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::Exactly(1)
    }
}

impl Cardinality {
    /// Whether another request may still be matched after `calls` matches.
    pub fn has_capacity(&self, calls: usize) -> bool {
        match self {
            Cardinality::Exactly(n) => calls < *n,
            Cardinality::ZeroOrMore => true,
        }
    }

    pub fn is_satisfied(&self, calls: usize) -> bool {
        match self {
            Cardinality::Exactly(n) => calls == *n,
            Cardinality::ZeroOrMore => true,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Exactly(n) => write!(f, "exactly {}", NCalls(*n)),
            Cardinality::ZeroOrMore => f.write_str("zero or more calls"),
        }
    }
}

pub(crate) struct NCalls(pub usize);

impl fmt::Display for NCalls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "no calls"),
            1 => write!(f, "1 call"),
            _ => write!(f, "{} calls", self.0),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced to the test from interception and verification.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// No registered expectation with remaining capacity matched the request.
    #[error(transparent)]
    UnexpectedRequest(#[from] UnexpectedRequest),

    /// One or more expectations were not invoked the declared number of times.
    #[error(transparent)]
    Verification(#[from] VerificationFailure),

    /// A predicate matcher returned an error.
    #[error("{field} matcher failed: {source}")]
    Predicate { field: Field, source: BoxError },

    /// A JSON response body could not be encoded.
    #[error("failed to encode JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

impl MockError {
    pub fn is_unexpected_request(&self) -> bool {
        matches!(self, MockError::UnexpectedRequest(_))
    }

    pub fn is_verification_failure(&self) -> bool {
        matches!(self, MockError::Verification(_))
    }
}

/// A request that nothing expected.
#[derive(Debug, Clone)]
pub struct UnexpectedRequest {
    pub method: String,
    pub url: String,
    pub query: Option<String>,
    /// Body text, truncated to the configured preview length.
    pub body: Option<String>,
    /// Expectations that are still open (unsatisfied or with capacity left).
    pub open_expectations: Vec<String>,
}

impl fmt::Display for UnexpectedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unexpected request: {} {}", self.method, self.url)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(body) = &self.body {
            write!(f, "\n  body: {body}")?;
        }
        if self.open_expectations.is_empty() {
            write!(f, "\n  no open expectations")
        } else {
            write!(f, "\n  open expectations:")?;
            for expectation in &self.open_expectations {
                write!(f, "\n    {expectation}")?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for UnexpectedRequest {}

/// One expectation whose realized count did not satisfy its cardinality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub index: usize,
    pub description: String,
    pub expected: Cardinality,
    pub actual: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}: expected {}, received {}",
            self.index,
            self.description,
            self.expected,
            NCalls(self.actual)
        )
    }
}

/// Every violated expectation of one verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub violations: Vec<Violation>,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} expectation(s) not satisfied:", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for VerificationFailure {}
