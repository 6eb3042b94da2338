// crates/sdk-test-helpers/src/assertions.rs
// ============================================================================
// Module: Polling Assertions
// Description: Assertions that retry a probe until it yields a value.
// Purpose: Replace arbitrary sleeps with bounded polling in tests.
// ============================================================================

//! Polling assertions for conditions that become true eventually.

use std::thread;
use std::time::Duration;
use std::time::Instant;

use crate::error::AssertionFailure;

/// Calls `probe` repeatedly until it returns `Some`, or fails once `timeout`
/// has elapsed.
///
/// The probe is always called at least once, and is retried every `interval`.
/// The last wait is cut short so the call never sleeps past the deadline.
///
/// # Errors
///
/// Returns [`AssertionFailure`] when the timeout expires without a value.
pub fn assert_polled_function_returns_value<T, F>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T, AssertionFailure>
where
    F: FnMut() -> Option<T>,
{
    let start = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        if let Some(value) = probe() {
            return Ok(value);
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(AssertionFailure::new(format!(
                "timed out after {}ms waiting for polled function to return a value \
                 ({attempts} attempts)",
                timeout.as_millis()
            )));
        }
        thread::sleep(interval.min(timeout.saturating_sub(elapsed)));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use std::time::Duration;
    use std::time::Instant;

    use super::assert_polled_function_returns_value;

    #[test]
    fn polled_function_succeeds_on_first_try() {
        let value = assert_polled_function_returns_value(
            Duration::from_secs(1),
            Duration::from_millis(10),
            || Some("yes"),
        )
        .unwrap();
        assert_eq!(value, "yes");
    }

    #[test]
    fn polled_function_succeeds_on_later_try() {
        let mut calls = 0;
        let value = assert_polled_function_returns_value(
            Duration::from_millis(500),
            Duration::from_millis(10),
            || {
                calls += 1;
                (calls >= 5).then_some("yes")
            },
        )
        .unwrap();
        assert_eq!(value, "yes");
        assert_eq!(calls, 5);
    }

    #[test]
    fn polled_function_times_out_after_retrying() {
        let mut calls = 0;
        let result = assert_polled_function_returns_value::<(), _>(
            Duration::from_millis(200),
            Duration::from_millis(10),
            || {
                calls += 1;
                None
            },
        );
        let err = result.unwrap_err();
        assert!(err.message.starts_with("timed out after 200ms"), "{}", err.message);
        assert!(calls > 1, "probe should be retried, got {calls} calls");
    }

    #[test]
    fn long_interval_does_not_overshoot_timeout() {
        let start = Instant::now();
        let mut calls = 0;
        let result = assert_polled_function_returns_value::<(), _>(
            Duration::from_millis(100),
            Duration::from_secs(1),
            || {
                calls += 1;
                None
            },
        );
        assert!(result.is_err());
        assert_eq!(calls, 2);
        let elapsed = start.elapsed();
        assert!(elapsed < Duration::from_millis(800), "took {}ms", elapsed.as_millis());
    }

    #[test]
    fn zero_timeout_still_calls_probe_once() {
        let mut calls = 0;
        let result = assert_polled_function_returns_value::<(), _>(
            Duration::ZERO,
            Duration::from_millis(10),
            || {
                calls += 1;
                None
            },
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
