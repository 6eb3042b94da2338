// crates/sdk-test-helpers/src/error.rs
// ============================================================================
// Module: Assertion Errors
// Description: Error type returned by assertion helpers.
// Purpose: Let tests propagate assertion failures with `?` or unwrap them.
// Dependencies: thiserror
// ============================================================================

//! The error type shared by every assertion helper.

use thiserror::Error;

/// A failed test assertion.
///
/// # Invariants
/// - `message` is the complete human-readable description of the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    /// Failure description.
    pub message: String,
}

impl AssertionFailure {
    /// Creates a failure with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
