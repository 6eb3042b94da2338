// crates/sdk-test-helpers/src/httptest/context.rs
// ============================================================================
// Module: Request Context
// Description: Request view plus response writer handed to handlers.
// Purpose: Hide the server framework behind a small blocking response API.
// Dependencies: bytes, tokio
// ============================================================================

//! ## Overview
//! A [`RequestContext`] carries the recorded [`RequestInfo`], any path
//! parameters captured by a router, and a response writer. Handlers run on a
//! blocking worker thread, so every operation here is synchronous.
//!
//! Invariants:
//! - The response head (status and headers) is committed exactly once: on the
//!   first chunked write, or when the handler returns.
//! - Status and header changes after the commit are ignored.
//! - Non-chunked bodies are buffered and sent with a content length.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::httptest::handler::HandlerError;
use crate::httptest::request::RequestInfo;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Buffered chunks allowed before a chunked write blocks.
const CHUNK_BUFFER: usize = 32;
/// Upper bound on a single wait slice while polling for close.
const CLOSE_POLL_SLICE: Duration = Duration::from_millis(20);

// ============================================================================
// SECTION: Shutdown Signal
// ============================================================================

/// One-way flag raised when the owning server begins shutting down.
#[derive(Default)]
pub(crate) struct ShutdownSignal {
    /// Whether shutdown was triggered.
    closed: Mutex<bool>,
    /// Notified when `closed` flips.
    changed: Condvar,
}

impl ShutdownSignal {
    /// Raises the flag and wakes all waiters.
    pub(crate) fn trigger(&self) {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        *closed = true;
        self.changed.notify_all();
    }

    /// Returns true once the flag is raised.
    pub(crate) fn is_triggered(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits up to `timeout` for the flag, returning whether it is raised.
    fn wait(&self, timeout: Duration) -> bool {
        let guard = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |closed| !*closed)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

// ============================================================================
// SECTION: Response Head
// ============================================================================

/// Body handed to the transport once the head is committed.
pub(crate) enum ResponseBody {
    /// Complete buffered body.
    Full(Bytes),
    /// Streamed chunks, ending when the sender is dropped.
    Stream(mpsc::Receiver<Result<Bytes, io::Error>>),
}

/// Committed response status, headers, and body source.
pub(crate) struct ResponseHead {
    /// HTTP status code.
    pub(crate) status: u16,
    /// Response headers in insertion order.
    pub(crate) headers: Vec<(String, String)>,
    /// Body source.
    pub(crate) body: ResponseBody,
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Request information and response writer passed to a
/// [`Handler`](crate::httptest::Handler).
pub struct RequestContext {
    /// Recorded request.
    request: RequestInfo,
    /// Path parameters captured by a router.
    path_params: Vec<String>,
    /// Pending response status.
    status: u16,
    /// Pending response headers.
    headers: Vec<(String, String)>,
    /// Buffered body for non-chunked responses.
    buffer: Vec<u8>,
    /// Whether the response streams chunks.
    chunked: bool,
    /// Head delivery channel; `None` once committed.
    head_tx: Option<oneshot::Sender<ResponseHead>>,
    /// Chunk sender for streamed bodies; `None` once finished.
    body_tx: Option<mpsc::Sender<Result<Bytes, io::Error>>>,
    /// Chunk receiver, moved into the head on a chunked commit.
    body_rx: Option<mpsc::Receiver<Result<Bytes, io::Error>>>,
    /// Server shutdown flag.
    shutdown: Arc<ShutdownSignal>,
}

impl RequestContext {
    /// Creates a context and the receiver for its committed head.
    pub(crate) fn new(
        request: RequestInfo,
        shutdown: Arc<ShutdownSignal>,
    ) -> (Self, oneshot::Receiver<ResponseHead>) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(CHUNK_BUFFER);
        let context = Self {
            request,
            path_params: Vec::new(),
            status: 200,
            headers: Vec::new(),
            buffer: Vec::new(),
            chunked: false,
            head_tx: Some(head_tx),
            body_tx: Some(body_tx),
            body_rx: Some(body_rx),
            shutdown,
        };
        (context, head_rx)
    }

    /// Returns the request being handled.
    #[must_use]
    pub const fn request(&self) -> &RequestInfo {
        &self.request
    }

    /// Returns a captured path parameter by zero-based position.
    ///
    /// Parameters exist only when a [`SimpleRouter`](crate::httptest::SimpleRouter)
    /// regex route with capture groups matched. For the pattern
    /// `/a/([^/]*)/c/(.*)` and the path `/a/b/c/d/e`, parameter 0 is `b` and
    /// parameter 1 is `d/e`.
    #[must_use]
    pub fn path_param(&self, index: usize) -> Option<&str> {
        self.path_params.get(index).map(String::as_str)
    }

    /// Replaces the captured path parameters.
    pub fn set_path_params(&mut self, params: Vec<String>) {
        self.path_params = params;
    }

    /// Sets the response status.
    pub const fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Sets a response header, replacing existing values of the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.add_header(name, value);
    }

    /// Adds a response header value, keeping existing values.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Switches the response to chunked streaming. Idempotent.
    pub const fn set_chunked(&mut self) {
        self.chunked = true;
    }

    /// Returns true once the response head was sent.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.head_tx.is_none()
    }

    /// Writes body data.
    ///
    /// In chunked mode each non-empty write is delivered to the client as its
    /// own chunk immediately, and an empty write only commits the head.
    /// Otherwise data is buffered until the handler returns.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Disconnected`] when the client went away, and
    /// [`HandlerError::Failed`] for buffered writes after the response was
    /// already sent.
    pub fn write(&mut self, data: &[u8]) -> Result<(), HandlerError> {
        if !self.chunked {
            if self.is_committed() {
                return Err(HandlerError::Failed("response was already sent".to_string()));
            }
            self.buffer.extend_from_slice(data);
            return Ok(());
        }
        self.commit()?;
        if data.is_empty() {
            return Ok(());
        }
        let sender = self.body_tx.as_ref().ok_or(HandlerError::Disconnected)?;
        sender
            .blocking_send(Ok(Bytes::copy_from_slice(data)))
            .map_err(|_| HandlerError::Disconnected)
    }

    /// Blocks until the server shuts down or the client disconnects
    /// (returning true), or `timeout` elapses (returning false).
    ///
    /// A `None` timeout waits indefinitely.
    #[must_use]
    pub fn wait_for_close(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if self.shutdown.is_triggered() || self.client_gone() {
                return true;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    remaining.min(CLOSE_POLL_SLICE)
                }
                None => CLOSE_POLL_SLICE,
            };
            if self.shutdown.wait(slice) {
                return true;
            }
        }
    }

    /// Returns true if the transport dropped its end of the response.
    fn client_gone(&self) -> bool {
        self.head_tx.as_ref().is_some_and(oneshot::Sender::is_closed)
            || (self.body_rx.is_none()
                && self.body_tx.as_ref().is_some_and(mpsc::Sender::is_closed))
    }

    /// Sends the response head if it has not been sent yet.
    fn commit(&mut self) -> Result<(), HandlerError> {
        let Some(head_tx) = self.head_tx.take() else {
            return Ok(());
        };
        let body = if self.chunked {
            self.body_rx
                .take()
                .map_or_else(|| ResponseBody::Full(Bytes::new()), ResponseBody::Stream)
        } else {
            ResponseBody::Full(Bytes::from(std::mem::take(&mut self.buffer)))
        };
        let head = ResponseHead {
            status: self.status,
            headers: std::mem::take(&mut self.headers),
            body,
        };
        head_tx.send(head).map_err(|_| HandlerError::Disconnected)
    }

    /// Replaces an uncommitted response with a bare error status.
    pub(crate) fn fail(&mut self, status: u16) {
        if self.is_committed() {
            return;
        }
        self.status = status;
        self.headers.clear();
        self.buffer.clear();
        self.chunked = false;
    }

    /// Commits the head if needed and ends any streamed body.
    pub(crate) fn finish(&mut self) {
        let _ = self.commit();
        self.body_tx = None;
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
