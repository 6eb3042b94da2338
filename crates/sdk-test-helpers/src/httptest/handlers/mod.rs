// crates/sdk-test-helpers/src/httptest/handlers/mod.rs
// ============================================================================
// Module: Standard Handlers
// Description: Prebuilt handlers for common test server responses.
// Purpose: Compose canned responses, delays, and streams without closures.
// Dependencies: bytes, serde_json
// ============================================================================

//! ## Overview
//! Each function returns a [`Handler`] that performs one step of a response.
//! Steps are combined with [`all`]:
//!
//! ```no_run
//! use sdk_test_helpers::httptest::handlers;
//!
//! let handler = handlers::all(vec![
//!     handlers::status(202),
//!     handlers::header("Etag", "abc"),
//!     handlers::body_string("text/plain", "accepted"),
//! ]);
//! # let _ = handler;
//! ```
//!
//! Streaming responses start with [`start_chunks`] and then write with
//! [`write_chunk`] or the [`sse`] helpers.

pub mod sse;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use crate::httptest::handler::Handler;
use crate::httptest::handler::HandlerError;

// ============================================================================
// SECTION: Response Basics
// ============================================================================

/// Sets the response status.
#[must_use]
pub fn status(code: u16) -> Handler {
    Handler::new(move |ctx| {
        ctx.set_status(code);
        Ok(())
    })
}

/// Sets a response header, replacing any previous values.
#[must_use]
pub fn header(name: &str, value: &str) -> Handler {
    let (name, value) = (name.to_string(), value.to_string());
    Handler::new(move |ctx| {
        ctx.set_header(&name, &value);
        Ok(())
    })
}

/// Adds a response header value, keeping previous values.
#[must_use]
pub fn add_header(name: &str, value: &str) -> Handler {
    let (name, value) = (name.to_string(), value.to_string());
    Handler::new(move |ctx| {
        ctx.add_header(&name, &value);
        Ok(())
    })
}

/// Sets the `Content-Type` (when given) and writes `data` as the body.
#[must_use]
pub fn body(content_type: Option<&str>, data: impl Into<Bytes>) -> Handler {
    let content_type = content_type.map(str::to_string);
    let data: Bytes = data.into();
    Handler::new(move |ctx| {
        if let Some(content_type) = &content_type {
            ctx.set_header("Content-Type", content_type);
        }
        ctx.write(&data)
    })
}

/// Writes a UTF-8 text body.
///
/// `;charset=utf-8` is appended to `content_type` unless it already names a
/// charset.
#[must_use]
pub fn body_string(content_type: &str, text: &str) -> Handler {
    let content_type = if content_type.to_ascii_lowercase().contains("charset=") {
        content_type.to_string()
    } else {
        format!("{content_type};charset=utf-8")
    };
    body(Some(&content_type), text.to_string())
}

/// Writes `value` as a JSON body with `application/json;charset=utf-8`.
#[must_use]
pub fn body_json(value: &Value) -> Handler {
    body(Some("application/json;charset=utf-8"), value.to_string())
}

// ============================================================================
// SECTION: Composition
// ============================================================================

/// Runs `handlers` in order, stopping at the first error.
#[must_use]
pub fn all(handlers: Vec<Handler>) -> Handler {
    Handler::new(move |ctx| handlers.iter().try_for_each(|handler| handler.apply(ctx)))
}

/// Sends the first request to the first handler, the second to the second,
/// and so on. Requests past the end keep going to the last handler.
///
/// An empty list answers every request with status 500.
#[must_use]
pub fn sequential(handlers: Vec<Handler>) -> Handler {
    let counter = Arc::new(AtomicUsize::new(0));
    Handler::new(move |ctx| {
        let index = counter.fetch_add(1, Ordering::SeqCst);
        let Some(last) = handlers.len().checked_sub(1) else {
            return Err(HandlerError::Failed("sequential handler list is empty".to_string()));
        };
        handlers[index.min(last)].apply(ctx)
    })
}

// ============================================================================
// SECTION: Timing
// ============================================================================

/// Sleeps for `duration`, returning early if the server closes or the client
/// disconnects.
#[must_use]
pub fn delay(duration: Duration) -> Handler {
    Handler::new(move |ctx| {
        let _ = ctx.wait_for_close(Some(duration));
        Ok(())
    })
}

/// Blocks until the server closes or the client disconnects.
#[must_use]
pub fn hang() -> Handler {
    Handler::new(|ctx| {
        let _ = ctx.wait_for_close(None);
        Ok(())
    })
}

// ============================================================================
// SECTION: Chunked Streaming
// ============================================================================

/// Starts a chunked 200 response with the given content type and optional
/// charset, sending the head immediately.
#[must_use]
pub fn start_chunks(content_type: &str, charset: Option<&str>) -> Handler {
    let content_type = match charset {
        Some(charset) => format!("{content_type};charset={}", charset.to_ascii_lowercase()),
        None => content_type.to_string(),
    };
    Handler::new(move |ctx| {
        ctx.set_status(200);
        ctx.set_header("Content-Type", &content_type);
        ctx.set_chunked();
        ctx.write(&[])
    })
}

/// Writes one chunk of a streamed response.
#[must_use]
pub fn write_chunk(data: impl Into<Bytes>) -> Handler {
    let data: Bytes = data.into();
    Handler::new(move |ctx| ctx.write(&data))
}

/// Writes one UTF-8 chunk of a streamed response.
#[must_use]
pub fn write_chunk_string(text: &str) -> Handler {
    write_chunk(text.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
