// crates/sdk-test-helpers/src/httptest/handlers/sse.rs
// ============================================================================
// Module: Server-Sent Events Handlers
// Description: Handlers that write an SSE stream.
// Purpose: Simulate streaming endpoints in client tests.
// Dependencies: none
// ============================================================================

//! ## Overview
//! A stream begins with [`start`], continues with [`event`], [`event_raw`],
//! or [`comment`], and typically ends with [`leave_open`] so the client sees
//! a live connection until the server closes.

use crate::httptest::handler::Handler;
use crate::httptest::handlers;

/// Starts a chunked `text/event-stream;charset=utf-8` response with
/// `Cache-Control: no-cache`.
#[must_use]
pub fn start() -> Handler {
    let stream = handlers::start_chunks("text/event-stream", Some("utf-8"));
    Handler::new(move |ctx| {
        ctx.set_header("Cache-Control", "no-cache");
        stream.apply(ctx)
    })
}

/// Writes an event with a name and data. Multi-line data is split into one
/// `data:` line per line.
#[must_use]
pub fn event(name: &str, data: &str) -> Handler {
    handlers::write_chunk_string(&format_event(name, data))
}

/// Writes preformatted event content followed by a blank line.
#[must_use]
pub fn event_raw(content: &str) -> Handler {
    handlers::write_chunk_string(&format!("{content}\n\n"))
}

/// Writes a comment line.
#[must_use]
pub fn comment(text: &str) -> Handler {
    handlers::write_chunk_string(&format!(":{text}\n"))
}

/// Keeps the stream open until the server closes or the client disconnects.
#[must_use]
pub fn leave_open() -> Handler {
    handlers::hang()
}

/// Formats a named event.
fn format_event(name: &str, data: &str) -> String {
    let mut out = format!("event: {name}\n");
    for line in data.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::format_event;

    #[test]
    fn single_line_event() {
        assert_eq!(format_event("e1", "d1"), "event: e1\ndata: d1\n\n");
    }

    #[test]
    fn multi_line_event_repeats_data_prefix() {
        assert_eq!(format_event("put", "a\nb"), "event: put\ndata: a\ndata: b\n\n");
    }
}
