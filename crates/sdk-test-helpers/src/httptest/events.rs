// crates/sdk-test-helpers/src/httptest/events.rs
// ============================================================================
// Module: Server Events
// Description: Structured lifecycle and request events for test servers.
// Purpose: Emit JSON-line logs without binding callers to a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`HttpServer`](crate::httptest::HttpServer) reports lifecycle and request
//! events to a [`ServerEventSink`]. Sinks are cheap to swap: tests that want
//! to assert on server activity use [`MemoryEventSink`], CI runs can enable
//! [`StderrEventSink`] through `SDK_TEST_HELPERS_LOG=stderr`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Server event classification.
///
/// # Invariants
/// - Variants are stable for log labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerEventKind {
    /// Listener bound and accepting connections.
    ServerStarted,
    /// Listener shut down.
    ServerStopped,
    /// Request received and recorded.
    RequestReceived,
    /// Response head sent, or the handler failed before sending one.
    RequestCompleted,
}

/// How a request completed.
///
/// # Invariants
/// - Variants are stable for log labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The handler committed a response head.
    Responded,
    /// The handler panicked before committing; answered with 500.
    HandlerAborted,
}

/// Server event payload.
///
/// # Invariants
/// - Optional fields are `None` when the event kind does not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerEvent {
    /// Event identifier.
    pub event: ServerEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Listening port.
    pub port: u16,
    /// Request method, for request events.
    pub method: Option<String>,
    /// Request path, for request events.
    pub path: Option<String>,
    /// Response status, for completion events.
    pub status: Option<u16>,
    /// Outcome, for completion events.
    pub outcome: Option<RequestOutcome>,
}

impl ServerEvent {
    /// Creates a lifecycle event with a consistent timestamp.
    #[must_use]
    pub fn lifecycle(event: ServerEventKind, port: u16) -> Self {
        Self {
            event,
            timestamp_ms: now_ms(),
            port,
            method: None,
            path: None,
            status: None,
            outcome: None,
        }
    }

    /// Creates a request-received event.
    #[must_use]
    pub fn request_received(port: u16, method: &str, path: &str) -> Self {
        Self {
            method: Some(method.to_string()),
            path: Some(path.to_string()),
            ..Self::lifecycle(ServerEventKind::RequestReceived, port)
        }
    }

    /// Creates a request-completed event.
    #[must_use]
    pub fn request_completed(
        port: u16,
        method: &str,
        path: &str,
        status: u16,
        outcome: RequestOutcome,
    ) -> Self {
        Self {
            method: Some(method.to_string()),
            path: Some(path.to_string()),
            status: Some(status),
            outcome: Some(outcome),
            ..Self::lifecycle(ServerEventKind::RequestCompleted, port)
        }
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for server events.
pub trait ServerEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &ServerEvent);
}

/// Sink that discards events.
pub struct NoopEventSink;

impl ServerEventSink for NoopEventSink {
    fn record(&self, _event: &ServerEvent) {}
}

/// Sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl ServerEventSink for StderrEventSink {
    fn record(&self, event: &ServerEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that keeps events in memory for inspection.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<ServerEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ServerEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the recorded events of one kind.
    #[must_use]
    pub fn events_of(&self, kind: ServerEventKind) -> Vec<ServerEvent> {
        self.events().into_iter().filter(|event| event.event == kind).collect()
    }
}

impl ServerEventSink for MemoryEventSink {
    fn record(&self, event: &ServerEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
