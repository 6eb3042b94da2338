// crates/sdk-test-helpers/src/httptest/server.rs
// ============================================================================
// Module: Test HTTP Server
// Description: Embedded HTTP/HTTPS server driven by blocking handlers.
// Purpose: Give client tests a real local endpoint with scripted behavior.
// Dependencies: axum, axum-server, tokio, tokio-stream, url
// ============================================================================

//! ## Overview
//! [`HttpServer`] listens on `127.0.0.1` and runs on its own thread with its
//! own tokio runtime, so it works the same from synchronous and async tests.
//! Each request is read in full, recorded, and then handed to the
//! [`Handler`] on a blocking worker thread.
//!
//! ```no_run
//! use sdk_test_helpers::httptest::HttpServer;
//! use sdk_test_helpers::httptest::handlers;
//!
//! let server = HttpServer::start(handlers::status(204))?;
//! // point a client at server.uri() ...
//! let request = server.recorder().require_request()?;
//! assert_eq!(request.path(), "/");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Invariants:
//! - The built-in recorder sees every request before the handler runs.
//! - Closing wakes hanging handlers before the listener stops.
//! - `close` is idempotent and also runs on drop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicU16;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::HOST;
use axum::http::uri::Authority;
use axum::response::Response;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use crate::config::default_event_sink;
use crate::httptest::context::RequestContext;
use crate::httptest::context::ResponseBody;
use crate::httptest::context::ResponseHead;
use crate::httptest::context::ShutdownSignal;
use crate::httptest::events::RequestOutcome;
use crate::httptest::events::ServerEvent;
use crate::httptest::events::ServerEventKind;
use crate::httptest::events::ServerEventSink;
use crate::httptest::handler::Handler;
use crate::httptest::recorder::RequestRecorder;
use crate::httptest::request::RequestInfo;
use crate::httptest::tls::ServerTlsConfig;
use crate::httptest::tls::TlsError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default time open connections get to finish after `close`.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);
/// Time the runtime gets to stop blocking workers after the listener stops.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
/// Worker threads for the server runtime.
const WORKER_THREADS: usize = 2;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpServerError {
    /// The listener could not bind the requested port.
    #[error("failed to bind test server: {0}")]
    Bind(String),
    /// The tokio runtime could not be created.
    #[error("failed to build test server runtime: {0}")]
    Runtime(String),
    /// The TLS configuration was rejected.
    #[error(transparent)]
    Tls(#[from] TlsError),
    /// The server thread failed before reporting its port.
    #[error("test server failed to start: {0}")]
    Startup(String),
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Configures and starts an [`HttpServer`].
pub struct HttpServerBuilder {
    /// Requested port; 0 picks any free port.
    port: u16,
    /// TLS material for HTTPS.
    tls: Option<ServerTlsConfig>,
    /// Event destination; `None` uses the environment-selected default.
    event_sink: Option<Arc<dyn ServerEventSink>>,
    /// Grace period for open connections on close.
    shutdown_grace: Duration,
}

impl Default for HttpServerBuilder {
    fn default() -> Self {
        Self {
            port: 0,
            tls: None,
            event_sink: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl HttpServerBuilder {
    /// Listens on a specific port instead of any free one.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Serves HTTPS with the given certificate.
    #[must_use]
    pub fn tls(mut self, tls: ServerTlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Sends server events to `sink` instead of the default sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn ServerEventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Sets how long open connections may linger after `close`.
    #[must_use]
    pub const fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Starts the server.
    ///
    /// # Errors
    ///
    /// Returns [`HttpServerError`] if the runtime, TLS setup, or listener
    /// fails.
    pub fn start(self, handler: impl Into<Handler>) -> Result<HttpServer, HttpServerError> {
        let tls = self.tls.as_ref().map(ServerTlsConfig::rustls_server_config).transpose()?;
        let sink = self.event_sink.unwrap_or_else(default_event_sink);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("sdk-test-http")
            .enable_all()
            .build()
            .map_err(|err| HttpServerError::Runtime(err.to_string()))?;

        let recorder = RequestRecorder::new();
        let shutdown = Arc::new(ShutdownSignal::default());
        let state = Arc::new(ServerState {
            handler: handler.into(),
            recorder: recorder.clone(),
            shutdown: Arc::clone(&shutdown),
            sink: Arc::clone(&sink),
            scheme: if tls.is_some() { "https" } else { "http" },
            port: AtomicU16::new(self.port),
        });
        let app = Router::new().fallback(dispatch).with_state(Arc::clone(&state));
        let handle: Handle<SocketAddr> = Handle::new();
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));

        let (ready_tx, ready_rx) = mpsc::channel();
        let serve_handle = handle.clone();
        let join = thread::Builder::new()
            .name("sdk-test-http-server".to_string())
            .spawn(move || {
                let tls = tls.map(RustlsConfig::from_config);
                run_server(runtime, addr, tls, app, serve_handle, &ready_tx);
            })
            .map_err(|err| HttpServerError::Startup(err.to_string()))?;

        let port = match ready_rx.recv() {
            Ok(Ok(port)) => port,
            Ok(Err(err)) => {
                let _ = join.join();
                return Err(err);
            }
            Err(_) => {
                let _ = join.join();
                return Err(HttpServerError::Startup("server thread exited".to_string()));
            }
        };
        state.port.store(port, Ordering::SeqCst);
        sink.record(&ServerEvent::lifecycle(ServerEventKind::ServerStarted, port));

        let uri = Url::parse(&format!("{}://localhost:{port}/", state.scheme))
            .map_err(|err| HttpServerError::Startup(err.to_string()))?;
        Ok(HttpServer {
            port,
            uri,
            recorder,
            shutdown,
            handle,
            shutdown_grace: self.shutdown_grace,
            sink,
            join: Some(join),
        })
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Running embedded test server.
pub struct HttpServer {
    /// Bound port.
    port: u16,
    /// Base URI, `{scheme}://localhost:{port}/`.
    uri: Url,
    /// Built-in recorder.
    recorder: RequestRecorder,
    /// Wakes hanging handlers on close.
    shutdown: Arc<ShutdownSignal>,
    /// Listener control.
    handle: Handle<SocketAddr>,
    /// Grace period for open connections on close.
    shutdown_grace: Duration,
    /// Event destination.
    sink: Arc<dyn ServerEventSink>,
    /// Server thread; `None` once closed.
    join: Option<thread::JoinHandle<()>>,
}

impl HttpServer {
    /// Returns a builder for servers that need non-default settings.
    #[must_use]
    pub fn builder() -> HttpServerBuilder {
        HttpServerBuilder::default()
    }

    /// Starts an HTTP server on any free port.
    ///
    /// # Errors
    ///
    /// Returns [`HttpServerError`] if the server cannot start.
    pub fn start(handler: impl Into<Handler>) -> Result<Self, HttpServerError> {
        Self::builder().start(handler)
    }

    /// Starts an HTTP server on a specific port.
    ///
    /// # Errors
    ///
    /// Returns [`HttpServerError::Bind`] if the port is unavailable.
    pub fn start_on_port(port: u16, handler: impl Into<Handler>) -> Result<Self, HttpServerError> {
        Self::builder().port(port).start(handler)
    }

    /// Starts an HTTPS server on any free port.
    ///
    /// # Errors
    ///
    /// Returns [`HttpServerError`] if the TLS setup or server fails.
    pub fn start_secure(
        tls: ServerTlsConfig,
        handler: impl Into<Handler>,
    ) -> Result<Self, HttpServerError> {
        Self::builder().tls(tls).start(handler)
    }

    /// Starts an HTTPS server on a specific port.
    ///
    /// # Errors
    ///
    /// Returns [`HttpServerError`] if the TLS setup or server fails.
    pub fn start_secure_on_port(
        tls: ServerTlsConfig,
        port: u16,
        handler: impl Into<Handler>,
    ) -> Result<Self, HttpServerError> {
        Self::builder().tls(tls).port(port).start(handler)
    }

    /// Returns the bound port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the base URI, ending in `/`.
    #[must_use]
    pub const fn uri(&self) -> &Url {
        &self.uri
    }

    /// Returns the recorder that sees every request.
    #[must_use]
    pub const fn recorder(&self) -> &RequestRecorder {
        &self.recorder
    }

    /// Shuts the server down and waits for its thread to exit.
    pub fn close(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        self.shutdown.trigger();
        self.handle.graceful_shutdown(Some(self.shutdown_grace));
        let _ = join.join();
        self.sink.record(&ServerEvent::lifecycle(ServerEventKind::ServerStopped, self.port));
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// SECTION: Server Thread
// ============================================================================

/// Serves until shutdown, reporting the bound port or the startup failure.
fn run_server(
    runtime: Runtime,
    addr: SocketAddr,
    tls: Option<RustlsConfig>,
    app: Router,
    handle: Handle<SocketAddr>,
    ready: &mpsc::Sender<Result<u16, HttpServerError>>,
) {
    runtime.block_on(async move {
        let service = app.into_make_service();
        let listener = handle.clone();
        let serve = match tls {
            Some(config) => tokio::spawn(async move {
                axum_server::bind_rustls(addr, config).handle(handle).serve(service).await
            }),
            None => tokio::spawn(async move {
                axum_server::bind(addr).handle(handle).serve(service).await
            }),
        };
        if let Some(local) = listener.listening().await {
            let _ = ready.send(Ok(local.port()));
            let _ = serve.await;
            return;
        }
        let err = match serve.await {
            Ok(Err(err)) => HttpServerError::Bind(err.to_string()),
            Ok(Ok(())) => HttpServerError::Startup("listener exited before binding".to_string()),
            Err(err) => HttpServerError::Startup(err.to_string()),
        };
        let _ = ready.send(Err(err));
    });
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
}

// ============================================================================
// SECTION: Request Dispatch
// ============================================================================

/// State shared by all requests to one server.
struct ServerState {
    /// User handler.
    handler: Handler,
    /// Built-in recorder.
    recorder: RequestRecorder,
    /// Shutdown flag handed to request contexts.
    shutdown: Arc<ShutdownSignal>,
    /// Event destination.
    sink: Arc<dyn ServerEventSink>,
    /// `http` or `https`.
    scheme: &'static str,
    /// Bound port, set once listening.
    port: AtomicU16,
}

/// Reads, records, and hands one request to the handler.
async fn dispatch(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let port = state.port.load(Ordering::SeqCst);
    let (parts, body) = request.into_parts();
    let Ok(body) = axum::body::to_bytes(body, usize::MAX).await else {
        return status_only(StatusCode::BAD_REQUEST);
    };
    let host = parts
        .headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| parts.uri.authority().map(Authority::as_str));
    let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let Some(uri) = request_uri(state.scheme, host, port, path_and_query) else {
        return status_only(StatusCode::BAD_REQUEST);
    };
    let headers = parts.headers.iter().map(|(name, value)| {
        (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned())
    });
    let info = RequestInfo::new(parts.method.as_str(), uri, headers, body);
    let (method, path) = (info.method().to_string(), info.path().to_string());

    state.recorder.record(info.clone());
    state.sink.record(&ServerEvent::request_received(port, &method, &path));

    let (mut context, head) = RequestContext::new(info, Arc::clone(&state.shutdown));
    let handler = state.handler.clone();
    drop(tokio::task::spawn_blocking(move || {
        if let Err(err) = handler.apply(&mut context) {
            context.fail(err.status());
        }
        context.finish();
    }));

    let (response, status, outcome) = match head.await {
        Ok(head) => {
            let status = head.status;
            (build_response(head), status, RequestOutcome::Responded)
        }
        Err(_) => {
            (status_only(StatusCode::INTERNAL_SERVER_ERROR), 500, RequestOutcome::HandlerAborted)
        }
    };
    state.sink.record(&ServerEvent::request_completed(port, &method, &path, status, outcome));
    response
}

/// Rebuilds the absolute request URI from the scheme, host, and target.
fn request_uri(scheme: &str, host: Option<&str>, port: u16, path_and_query: &str) -> Option<Url> {
    host.and_then(|host| Url::parse(&format!("{scheme}://{host}{path_and_query}")).ok())
        .or_else(|| Url::parse(&format!("{scheme}://localhost:{port}{path_and_query}")).ok())
}

/// Converts a committed head into a framework response.
///
/// Headers with invalid names or values are dropped.
fn build_response(head: ResponseHead) -> Response {
    let body = match head.body {
        ResponseBody::Full(bytes) => Body::from(bytes),
        ResponseBody::Stream(chunks) => Body::from_stream(ReceiverStream::new(chunks)),
    };
    let mut response = Response::new(body);
    *response.status_mut() =
        StatusCode::from_u16(head.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in head.headers {
        let name = HeaderName::from_bytes(name.as_bytes());
        let value = HeaderValue::from_str(&value);
        if let (Ok(name), Ok(value)) = (name, value) {
            response.headers_mut().append(name, value);
        }
    }
    response
}

/// Empty response with a status.
fn status_only(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
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

    use axum::body::Bytes;
    use axum::http::StatusCode;

    use super::ResponseBody;
    use super::ResponseHead;
    use super::build_response;
    use super::request_uri;

    #[test]
    fn uri_uses_host_header_when_valid() {
        let uri = request_uri("http", Some("example.test:81"), 9, "/a?b=c").unwrap();
        assert_eq!(uri.as_str(), "http://example.test:81/a?b=c");
    }

    #[test]
    fn uri_falls_back_to_localhost() {
        let uri = request_uri("https", Some("bad host"), 4443, "/x").unwrap();
        assert_eq!(uri.as_str(), "https://localhost:4443/x");
        let uri = request_uri("http", None, 8080, "/").unwrap();
        assert_eq!(uri.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn response_keeps_header_order_and_drops_invalid_names() {
        let head = ResponseHead {
            status: 419,
            headers: vec![
                ("X-A".to_string(), "1".to_string()),
                ("bad name".to_string(), "2".to_string()),
                ("x-a".to_string(), "3".to_string()),
            ],
            body: ResponseBody::Full(Bytes::from_static(b"body")),
        };
        let response = build_response(head);
        assert_eq!(response.status(), StatusCode::from_u16(419).unwrap());
        let values: Vec<_> =
            response.headers().get_all("x-a").iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(values, vec!["1", "3"]);
        assert_eq!(response.headers().len(), 2);
    }
}
