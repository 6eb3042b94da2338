// crates/sdk-test-helpers/src/concurrent.rs
// ============================================================================
// Module: Concurrency Assertions
// Description: Timing assertions for channels and futures.
// Purpose: Bound waits on asynchronous work observed from tests.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! Helpers for asserting that a value arrives (or does not arrive) within a
//! deadline. Channel helpers block the calling thread; future helpers are
//! async and rely on [`tokio::time::timeout`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Debug;
use std::future::Future;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::AssertionFailure;

// ============================================================================
// SECTION: Channel Assertions
// ============================================================================

/// Waits for a value from `values` and consumes it.
///
/// # Errors
///
/// Returns [`AssertionFailure`] if no value arrives within `wait`, or the
/// channel disconnects first.
pub fn await_value<T>(values: &Receiver<T>, wait: Duration) -> Result<T, AssertionFailure> {
    match values.recv_timeout(wait) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => Err(AssertionFailure::new(format!(
            "did not receive expected value within {}ms",
            wait.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => {
            Err(AssertionFailure::new("channel closed before a value was received"))
        }
    }
}

/// Asserts that no value arrives on `values` within `wait`.
///
/// A disconnected channel can never produce a value, so it satisfies the
/// assertion immediately.
///
/// # Errors
///
/// Returns [`AssertionFailure`] if a value was available.
#[allow(clippy::use_debug, reason = "Failure messages echo the unexpected value.")]
pub fn assert_no_more_values<T: Debug>(
    values: &Receiver<T>,
    wait: Duration,
) -> Result<(), AssertionFailure> {
    match values.recv_timeout(wait) {
        Ok(value) => Err(AssertionFailure::new(format!(
            "expected no more values, but received: {value:?}"
        ))),
        Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Ok(()),
    }
}

// ============================================================================
// SECTION: Future Assertions
// ============================================================================

/// Asserts that `future` completes within `wait`, returning its output.
///
/// # Errors
///
/// Returns [`AssertionFailure`] if the timeout expires first.
pub async fn assert_future_completes<F>(
    future: F,
    wait: Duration,
) -> Result<F::Output, AssertionFailure>
where
    F: Future,
{
    timeout(wait, future).await.map_err(|_| AssertionFailure::new("timed out waiting for future"))
}

/// Asserts that `future` is still pending after `wait`.
///
/// # Errors
///
/// Returns [`AssertionFailure`] if the future completed.
pub async fn assert_future_does_not_complete<F>(
    future: F,
    wait: Duration,
) -> Result<(), AssertionFailure>
where
    F: Future,
{
    match timeout(wait, future).await {
        Ok(_) => Err(AssertionFailure::new("future was unexpectedly completed")),
        Err(_) => Ok(()),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
