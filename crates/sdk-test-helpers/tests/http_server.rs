// crates/sdk-test-helpers/tests/http_server.rs
// ============================================================================
// Module: Test HTTP Server Tests
// Description: End-to-end checks for server lifecycle and handler behavior.
// Purpose: Exercise the server over real sockets with a real HTTP client.
// ============================================================================

//! Lifecycle, routing, and handler tests for the test HTTP server.

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

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use reqwest::blocking::Client;
use sdk_test_helpers::httptest::Handler;
use sdk_test_helpers::httptest::HandlerError;
use sdk_test_helpers::httptest::HandlerSwitcher;
use sdk_test_helpers::httptest::HttpServer;
use sdk_test_helpers::httptest::HttpServerError;
use sdk_test_helpers::httptest::SimpleRouter;
use sdk_test_helpers::httptest::events::MemoryEventSink;
use sdk_test_helpers::httptest::events::RequestOutcome;
use sdk_test_helpers::httptest::events::ServerEventKind;
use sdk_test_helpers::httptest::handlers;
use serde_json::json;

fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

fn get_status(client: &Client, url: &url::Url) -> u16 {
    client.get(url.clone()).send().unwrap().status().as_u16()
}

/// Returns a port that was free a moment ago.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

#[test]
fn server_with_simple_status_handler() {
    let server = HttpServer::start(handlers::status(419)).unwrap();
    assert_eq!(get_status(&client(), server.uri()), 419);
}

#[test]
fn server_on_specific_port() {
    let port = free_port();
    let server = HttpServer::start_on_port(port, handlers::status(419)).unwrap();
    assert_eq!(server.port(), port);
    assert_eq!(server.uri().as_str(), format!("http://localhost:{port}/"));
    assert_eq!(get_status(&client(), server.uri()), 419);
}

#[test]
fn multiple_servers() {
    let server1 = HttpServer::start(handlers::status(200)).unwrap();
    let server2 = HttpServer::start(handlers::status(419)).unwrap();
    let client = client();
    assert_eq!(get_status(&client, server1.uri()), 200);
    assert_eq!(get_status(&client, server2.uri()), 419);
}

#[test]
fn port_in_use_is_a_bind_error() {
    let server = HttpServer::start(handlers::status(200)).unwrap();
    let err = HttpServer::start_on_port(server.port(), handlers::status(200)).err().unwrap();
    assert!(matches!(err, HttpServerError::Bind(_)), "{err:?}");
}

#[test]
fn close_is_idempotent_and_stops_listening() {
    let mut server = HttpServer::start(handlers::status(200)).unwrap();
    let uri = server.uri().clone();
    server.close();
    server.close();
    assert!(client().get(uri).timeout(Duration::from_secs(2)).send().is_err());
}

#[test]
fn close_wakes_hanging_handler() {
    let mut server = HttpServer::start(handlers::hang()).unwrap();
    let uri = server.uri().clone();
    let request = std::thread::spawn(move || client().get(uri).send());
    server.recorder().require_request().unwrap();
    let start = Instant::now();
    server.close();
    assert!(start.elapsed() < Duration::from_secs(5));
    let _ = request.join().unwrap();
}

#[test]
fn lifecycle_and_request_events_reach_sink() {
    let sink = Arc::new(MemoryEventSink::new());
    let mut server = HttpServer::builder()
        .event_sink(Arc::clone(&sink) as _)
        .start(handlers::status(201))
        .unwrap();
    client().get(server.uri().join("/events").unwrap()).send().unwrap();
    server.close();

    let kinds: Vec<ServerEventKind> = sink.events().iter().map(|event| event.event).collect();
    assert_eq!(
        kinds,
        vec![
            ServerEventKind::ServerStarted,
            ServerEventKind::RequestReceived,
            ServerEventKind::RequestCompleted,
            ServerEventKind::ServerStopped,
        ]
    );
    let completed = &sink.events_of(ServerEventKind::RequestCompleted)[0];
    assert_eq!(completed.port, server.port());
    assert_eq!(completed.path.as_deref(), Some("/events"));
    assert_eq!(completed.status, Some(201));
    assert_eq!(completed.outcome, Some(RequestOutcome::Responded));
}

#[test]
fn panicking_handler_is_logged_as_aborted() {
    let sink = Arc::new(MemoryEventSink::new());
    let server = HttpServer::builder()
        .event_sink(Arc::clone(&sink) as _)
        .start(Handler::new(|_| panic!("handler exploded")))
        .unwrap();
    assert_eq!(get_status(&client(), server.uri()), 500);

    let completed = sink.events_of(ServerEventKind::RequestCompleted);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].status, Some(500));
    assert_eq!(completed[0].outcome, Some(RequestOutcome::HandlerAborted));
}

// ============================================================================
// SECTION: Handler Outcomes
// ============================================================================

#[test]
fn bad_request_error_maps_to_400() {
    let handler = Handler::new(|_| Err(HandlerError::BadRequest("missing key".to_string())));
    let server = HttpServer::start(handler).unwrap();
    assert_eq!(get_status(&client(), server.uri()), 400);
}

#[test]
fn failed_handler_maps_to_500_and_discards_partial_response() {
    let handler = handlers::all(vec![
        handlers::header("X-Partial", "yes"),
        handlers::body_string("text/plain", "partial"),
        Handler::new(|_| Err(HandlerError::Failed("boom".to_string()))),
    ]);
    let server = HttpServer::start(handler).unwrap();
    let resp = client().get(server.uri().clone()).send().unwrap();
    assert_eq!(resp.status().as_u16(), 500);
    assert!(resp.headers().get("x-partial").is_none());
    assert_eq!(resp.text().unwrap(), "");
}

#[test]
fn panicking_handler_maps_to_500_and_server_keeps_serving() {
    let handler = handlers::sequential(vec![
        Handler::new(|_| panic!("handler exploded")),
        handlers::status(200),
    ]);
    let server = HttpServer::start(handler).unwrap();
    let client = client();
    assert_eq!(get_status(&client, server.uri()), 500);
    assert_eq!(get_status(&client, server.uri()), 200);
}

#[test]
fn response_headers_and_json_body() {
    let handler = handlers::all(vec![
        handlers::status(202),
        handlers::add_header("X-Multi", "a"),
        handlers::add_header("X-Multi", "b"),
        handlers::body_json(&json!({"flags": {"on": true}})),
    ]);
    let server = HttpServer::start(handler).unwrap();
    let resp = client().get(server.uri().clone()).send().unwrap();
    assert_eq!(resp.status().as_u16(), 202);
    let multi: Vec<&str> =
        resp.headers().get_all("x-multi").iter().map(|value| value.to_str().unwrap()).collect();
    assert_eq!(multi, vec!["a", "b"]);
    assert_eq!(resp.headers()["content-type"], "application/json;charset=utf-8");
    assert_eq!(resp.headers()["content-length"], "21");
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body, json!({"flags": {"on": true}}));
}

#[test]
fn sequential_handlers_answer_in_order() {
    let server = HttpServer::start(handlers::sequential(vec![
        handlers::status(503),
        handlers::status(200),
    ]))
    .unwrap();
    let client = client();
    let statuses: Vec<u16> = (0..3).map(|_| get_status(&client, server.uri())).collect();
    assert_eq!(statuses, vec![503, 200, 200]);
}

#[test]
fn delay_postpones_response() {
    let server = HttpServer::start(handlers::all(vec![
        handlers::delay(Duration::from_millis(200)),
        handlers::status(200),
    ]))
    .unwrap();
    let start = Instant::now();
    assert_eq!(get_status(&client(), server.uri()), 200);
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[test]
fn concurrent_requests_are_served_in_parallel() {
    let server = HttpServer::start(handlers::all(vec![
        handlers::delay(Duration::from_millis(300)),
        handlers::status(200),
    ]))
    .unwrap();
    let start = Instant::now();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let uri = server.uri().clone();
            std::thread::spawn(move || get_status(&client(), &uri))
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap(), 200);
    }
    assert!(start.elapsed() < Duration::from_millis(1100), "requests were serialized");
}

// ============================================================================
// SECTION: Routing and Switching
// ============================================================================

#[test]
fn router_dispatches_by_path_and_method() {
    let router = SimpleRouter::new()
        .add_method("GET", "/flags", handlers::body_string("text/plain", "flags"))
        .add_regex_method(
            "PUT",
            "/flags/([^/]+)",
            Handler::new(|ctx| {
                let key = ctx.path_param(0).unwrap_or_default().to_string();
                ctx.write(key.as_bytes())
            }),
        )
        .unwrap();
    let server = HttpServer::start(router).unwrap();
    let client = client();

    let resp = client.get(server.uri().join("/flags").unwrap()).send().unwrap();
    assert_eq!(resp.text().unwrap(), "flags");
    let resp = client.put(server.uri().join("/flags/my-flag").unwrap()).send().unwrap();
    assert_eq!(resp.text().unwrap(), "my-flag");
    assert_eq!(get_status(&client, &server.uri().join("/flags/my-flag").unwrap()), 405);
    assert_eq!(get_status(&client, &server.uri().join("/segments").unwrap()), 404);
}

#[test]
fn switcher_changes_behavior_between_requests() {
    let switcher = HandlerSwitcher::new(handlers::status(200));
    let server = HttpServer::start(switcher.handler()).unwrap();
    let client = client();
    assert_eq!(get_status(&client, server.uri()), 200);
    switcher.set_target(handlers::status(401));
    assert_eq!(get_status(&client, server.uri()), 401);
}
