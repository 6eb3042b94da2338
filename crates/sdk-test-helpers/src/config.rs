// crates/sdk-test-helpers/src/config.rs
// ============================================================================
// Module: Test Helper Configuration
// Description: Environment-driven timeout and logging configuration.
// Purpose: Keep helper timeouts and server logging tunable on slow CI hosts.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Two environment variables tune the helpers without code changes:
//! - [`ENV_TIMEOUT_SECS`]: a positive integer number of seconds that acts as a
//!   minimum for timeouts passed through [`resolve_timeout`]. It never
//!   shortens an explicitly longer timeout.
//! - [`ENV_LOG`]: `stderr` routes server events to
//!   [`StderrEventSink`]. Unset, empty, or `off` discards them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::httptest::events::NoopEventSink;
use crate::httptest::events::ServerEventSink;
use crate::httptest::events::StderrEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the minimum timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "SDK_TEST_HELPERS_TIMEOUT_SEC";
/// Environment variable selecting the default server event sink.
pub const ENV_LOG: &str = "SDK_TEST_HELPERS_LOG";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Invalid helper configuration.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Timeout override is not a positive integer.
    #[error("SDK_TEST_HELPERS_TIMEOUT_SEC {0}")]
    InvalidTimeout(&'static str),
    /// Log selector is not recognized.
    #[error("SDK_TEST_HELPERS_LOG must be `stderr` or `off`, got `{0}`")]
    InvalidLogSink(String),
}

// ============================================================================
// SECTION: Timeouts
// ============================================================================

/// Returns the effective timeout, honoring [`ENV_TIMEOUT_SECS`] when set.
///
/// An invalid override is ignored and `requested` is returned; use
/// [`try_resolve_timeout`] to surface it.
#[must_use]
pub fn resolve_timeout(requested: Duration) -> Duration {
    resolve_timeout_with(env::var(ENV_TIMEOUT_SECS).ok().as_deref(), requested)
}

/// Returns the effective timeout, honoring [`ENV_TIMEOUT_SECS`] when set.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTimeout`] when the override is malformed.
pub fn try_resolve_timeout(requested: Duration) -> Result<Duration, ConfigError> {
    try_resolve_timeout_with(env::var(ENV_TIMEOUT_SECS).ok().as_deref(), requested)
}

/// Applies a raw override value to `requested`, ignoring invalid overrides.
#[must_use]
pub fn resolve_timeout_with(raw: Option<&str>, requested: Duration) -> Duration {
    try_resolve_timeout_with(raw, requested).unwrap_or(requested)
}

/// Applies a raw override value to `requested`. The override only widens.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTimeout`] when `raw` is present but malformed.
pub fn try_resolve_timeout_with(
    raw: Option<&str>,
    requested: Duration,
) -> Result<Duration, ConfigError> {
    match raw {
        Some(raw) => Ok(requested.max(parse_timeout_secs(raw)?)),
        None => Ok(requested),
    }
}

/// Parses a timeout override in whole seconds.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTimeout`] for empty, non-numeric, or zero input.
pub fn parse_timeout_secs(raw: &str) -> Result<Duration, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidTimeout("must be a positive integer number of seconds"));
    }
    let secs: u64 = trimmed
        .parse()
        .map_err(|_| ConfigError::InvalidTimeout("must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(ConfigError::InvalidTimeout("must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Server event sink selectable through [`ENV_LOG`].
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    /// Discard events.
    Off,
    /// JSON lines on stderr.
    Stderr,
}

impl LogSink {
    /// Builds the sink.
    #[must_use]
    pub fn into_sink(self) -> Arc<dyn ServerEventSink> {
        match self {
            Self::Off => Arc::new(NoopEventSink),
            Self::Stderr => Arc::new(StderrEventSink),
        }
    }
}

/// Returns the server event sink selected by [`ENV_LOG`], falling back to
/// [`NoopEventSink`] when the selector is invalid.
#[must_use]
pub fn default_event_sink() -> Arc<dyn ServerEventSink> {
    log_sink_for(env::var(ENV_LOG).ok().as_deref()).into_sink()
}

/// Returns the server event sink selected by [`ENV_LOG`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidLogSink`] for unrecognized selectors.
pub fn event_sink_from_env() -> Result<Arc<dyn ServerEventSink>, ConfigError> {
    let raw = env::var(ENV_LOG).unwrap_or_default();
    parse_log_sink(&raw).map(LogSink::into_sink)
}

/// Selects a sink from a raw selector, falling back to [`LogSink::Off`] when
/// it is absent or invalid.
#[must_use]
pub fn log_sink_for(raw: Option<&str>) -> LogSink {
    raw.and_then(|raw| parse_log_sink(raw).ok()).unwrap_or(LogSink::Off)
}

/// Parses a sink selector.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidLogSink`] for unrecognized selectors.
pub fn parse_log_sink(raw: &str) -> Result<LogSink, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Ok(LogSink::Off),
        "stderr" => Ok(LogSink::Stderr),
        other => Err(ConfigError::InvalidLogSink(other.to_string())),
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

    use super::ConfigError;
    use super::LogSink;
    use super::log_sink_for;
    use super::parse_log_sink;
    use super::parse_timeout_secs;
    use super::resolve_timeout_with;
    use super::try_resolve_timeout_with;

    #[test]
    fn timeout_override_parses_whole_seconds() {
        assert_eq!(parse_timeout_secs(" 30 ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn timeout_override_rejects_bad_values() {
        assert_eq!(
            parse_timeout_secs("0").unwrap_err(),
            ConfigError::InvalidTimeout("must be greater than zero")
        );
        assert!(parse_timeout_secs("").is_err());
        assert!(parse_timeout_secs("1.5").is_err());
        assert!(parse_timeout_secs("-3").is_err());
    }

    #[test]
    fn timeout_error_names_the_variable() {
        let err = parse_timeout_secs("abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "SDK_TEST_HELPERS_TIMEOUT_SEC must be a positive integer number of seconds"
        );
    }

    #[test]
    fn timeout_override_widens_shorter_timeouts() {
        let widened = resolve_timeout_with(Some("30"), Duration::from_secs(5));
        assert_eq!(widened, Duration::from_secs(30));
    }

    #[test]
    fn timeout_override_keeps_longer_timeouts() {
        let kept = resolve_timeout_with(Some("2"), Duration::from_secs(10));
        assert_eq!(kept, Duration::from_secs(10));
        let kept = resolve_timeout_with(Some("1"), Duration::from_millis(1500));
        assert_eq!(kept, Duration::from_millis(1500));
    }

    #[test]
    fn missing_timeout_override_keeps_requested() {
        assert_eq!(resolve_timeout_with(None, Duration::from_secs(5)), Duration::from_secs(5));
        assert_eq!(
            try_resolve_timeout_with(None, Duration::from_secs(5)).unwrap(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn invalid_timeout_override_falls_back_to_requested() {
        let requested = Duration::from_secs(5);
        assert_eq!(resolve_timeout_with(Some("0"), requested), requested);
        assert_eq!(resolve_timeout_with(Some("abc"), requested), requested);
        assert_eq!(
            try_resolve_timeout_with(Some("abc"), requested).unwrap_err(),
            ConfigError::InvalidTimeout("must be a positive integer number of seconds")
        );
    }

    #[test]
    fn log_selector_accepts_known_sinks() {
        assert_eq!(parse_log_sink("").unwrap(), LogSink::Off);
        assert_eq!(parse_log_sink("off").unwrap(), LogSink::Off);
        assert_eq!(parse_log_sink("STDERR").unwrap(), LogSink::Stderr);
    }

    #[test]
    fn log_selector_rejects_unknown_sinks() {
        let err = parse_log_sink("syslog").unwrap_err();
        assert_eq!(err, ConfigError::InvalidLogSink("syslog".to_string()));
    }

    #[test]
    fn default_sink_selection_falls_back_to_off() {
        assert_eq!(log_sink_for(None), LogSink::Off);
        assert_eq!(log_sink_for(Some("syslog")), LogSink::Off);
        assert_eq!(log_sink_for(Some(" stderr ")), LogSink::Stderr);
    }
}
