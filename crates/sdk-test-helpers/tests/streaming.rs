// crates/sdk-test-helpers/tests/streaming.rs
// ============================================================================
// Module: Streaming Response Tests
// Description: Verify chunked and SSE responses reach the client per write.
// Purpose: Ensure each chunk is flushed before the handler moves on.
// ============================================================================

//! Chunked and server-sent event streaming tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::io::Read;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;
use std::time::Instant;

use reqwest::blocking::Client;
use sdk_test_helpers::httptest::Handler;
use sdk_test_helpers::httptest::HttpServer;
use sdk_test_helpers::httptest::handlers;
use sdk_test_helpers::httptest::handlers::sse;

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

/// Runs `start`, then each chunk action in lockstep with the reader, then
/// `end`, asserting the client sees every chunk as its own read.
fn run_streaming_test(
    start: Handler,
    chunk_actions: Vec<Handler>,
    end: Handler,
    expected_content_type: &str,
    expected_chunks: &[&str],
) {
    let (wrote_tx, wrote_rx) = mpsc::channel::<usize>();
    let (read_tx, read_rx) = mpsc::channel::<()>();
    let read_rx = Arc::new(Mutex::new(read_rx));
    let wrote_tx = Mutex::new(wrote_tx);
    let steps = Handler::new(move |ctx| {
        for (index, action) in chunk_actions.iter().enumerate() {
            action.apply(ctx)?;
            wrote_tx.lock().unwrap().send(index).unwrap();
            read_rx.lock().unwrap().recv_timeout(STEP_TIMEOUT).unwrap();
        }
        Ok(())
    });
    let server = HttpServer::start(handlers::all(vec![start, steps, end])).unwrap();

    let mut resp = client().get(server.uri().clone()).send().unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(
        content_type.eq_ignore_ascii_case(expected_content_type),
        "unexpected content type {content_type}"
    );

    for (index, expected) in expected_chunks.iter().enumerate() {
        assert_eq!(wrote_rx.recv_timeout(STEP_TIMEOUT).unwrap(), index);
        let mut received = Vec::new();
        let mut buf = [0_u8; 100];
        while received.len() < expected.len() {
            let n = resp.read(&mut buf).unwrap();
            assert!(n > 0, "stream ended before chunk {index}");
            received.extend_from_slice(&buf[..n]);
        }
        assert_eq!(String::from_utf8(received).unwrap(), *expected);
        read_tx.send(()).unwrap();
    }
}

fn string_chunks(chunks: &[&str]) -> Vec<Handler> {
    chunks.iter().map(|chunk| handlers::write_chunk_string(chunk)).collect()
}

#[test]
fn basic_chunked_response_with_no_charset_in_header() {
    let chunks = ["first.", "second.", "third"];
    run_streaming_test(
        handlers::start_chunks("text/plain", None),
        string_chunks(&chunks),
        handlers::hang(),
        "text/plain",
        &chunks,
    );
}

#[test]
fn basic_chunked_response_with_charset_in_header() {
    let chunks = ["first.", "second.", "third"];
    run_streaming_test(
        handlers::start_chunks("text/plain", Some("UTF-8")),
        string_chunks(&chunks),
        handlers::hang(),
        "text/plain;charset=utf-8",
        &chunks,
    );
}

#[test]
fn sse_stream() {
    run_streaming_test(
        sse::start(),
        vec![
            sse::event("e1", "d1"),
            sse::comment("comment"),
            sse::event("e2", "d2"),
            sse::event_raw("data: all done"),
        ],
        sse::leave_open(),
        "text/event-stream;charset=utf-8",
        &["event: e1\ndata: d1\n\n", ":comment\n", "event: e2\ndata: d2\n\n", "data: all done\n\n"],
    );
}

#[test]
fn sse_start_disables_caching() {
    let handler = handlers::all(vec![sse::start(), sse::event("put", "{}")]);
    let server = HttpServer::start(handler).unwrap();
    let resp = client().get(server.uri().clone()).send().unwrap();
    assert_eq!(resp.headers()["cache-control"], "no-cache");
    assert_eq!(resp.text().unwrap(), "event: put\ndata: {}\n\n");
}

#[test]
fn closing_server_releases_open_stream() {
    let handler = handlers::all(vec![sse::start(), sse::leave_open()]);
    let mut server = HttpServer::start(handler).unwrap();
    let mut resp = client().get(server.uri().clone()).send().unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let start = Instant::now();
    server.close();
    assert!(start.elapsed() < STEP_TIMEOUT, "close waited on the hanging handler");
    let mut rest = Vec::new();
    let _ = resp.read_to_end(&mut rest);
}
