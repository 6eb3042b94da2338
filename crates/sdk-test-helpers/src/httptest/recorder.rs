// crates/sdk-test-helpers/src/httptest/recorder.rs
// ============================================================================
// Module: Request Recorder
// Description: Thread-safe queue of received requests.
// Purpose: Let tests wait for and inspect the requests a server received.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every [`HttpServer`](crate::httptest::HttpServer) owns a recorder that sees
//! all requests. A standalone [`RequestRecorder`] can be placed inside a
//! router or handler chain to capture only a subset.
//!
//! Invariants:
//! - Requests are dequeued in arrival order.
//! - A disabled recorder drops requests instead of queuing them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use thiserror::Error;

use crate::config::resolve_timeout;
use crate::httptest::handler::Handler;
use crate::httptest::request::RequestInfo;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default wait for [`RequestRecorder::require_request`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Recorder expectation failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    /// No request arrived before the timeout.
    #[error("no request received within {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u128,
    },
    /// A request arrived when none was expected.
    #[error("received an unexpected request: {method} {path}")]
    UnexpectedRequest {
        /// Method of the unexpected request.
        method: String,
        /// Path of the unexpected request.
        path: String,
    },
}

// ============================================================================
// SECTION: Recorder
// ============================================================================

/// Shared recorder state.
struct RecorderInner {
    /// Queued requests.
    queue: Mutex<VecDeque<RequestInfo>>,
    /// Notified when a request is queued.
    arrived: Condvar,
    /// Whether new requests are queued.
    enabled: AtomicBool,
}

/// Records requests for later inspection.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct RequestRecorder {
    /// Shared state.
    inner: Arc<RecorderInner>,
}

impl Default for RequestRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestRecorder {
    /// Creates an empty, enabled recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RecorderInner {
                queue: Mutex::new(VecDeque::new()),
                arrived: Condvar::new(),
                enabled: AtomicBool::new(true),
            }),
        }
    }

    /// Returns a handler that records each request it sees.
    #[must_use]
    pub fn handler(&self) -> Handler {
        let recorder = self.clone();
        Handler::new(move |ctx| {
            recorder.record(ctx.request().clone());
            Ok(())
        })
    }

    /// Queues a request if recording is enabled.
    pub fn record(&self, request: RequestInfo) {
        if !self.inner.enabled.load(Ordering::SeqCst) {
            return;
        }
        let mut queue = self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.push_back(request);
        self.inner.arrived.notify_all();
    }

    /// Enables or disables recording. Already queued requests are kept.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Returns the number of queued requests not yet consumed.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Consumes the first queued request, waiting up to [`DEFAULT_TIMEOUT`]
    /// (widened by the timeout override, see [`resolve_timeout`]).
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Timeout`] if no request arrives in time.
    pub fn require_request(&self) -> Result<RequestInfo, RecorderError> {
        self.require_request_within(resolve_timeout(DEFAULT_TIMEOUT))
    }

    /// Consumes the first queued request, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Timeout`] if no request arrives in time.
    pub fn require_request_within(&self, timeout: Duration) -> Result<RequestInfo, RecorderError> {
        self.poll(timeout).ok_or(RecorderError::Timeout {
            timeout_ms: timeout.as_millis(),
        })
    }

    /// Asserts that no request is queued or arrives within `timeout`.
    ///
    /// An unexpected request is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::UnexpectedRequest`] naming the request.
    pub fn require_no_requests(&self, timeout: Duration) -> Result<(), RecorderError> {
        match self.poll(timeout) {
            Some(request) => Err(RecorderError::UnexpectedRequest {
                method: request.method().to_string(),
                path: request.path().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Pops the first request, waiting up to `timeout` for one to arrive.
    fn poll(&self, timeout: Duration) -> Option<RequestInfo> {
        let queue = self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut queue, _) = self
            .inner
            .arrived
            .wait_timeout_while(queue, timeout, |queue| queue.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        queue.pop_front()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
