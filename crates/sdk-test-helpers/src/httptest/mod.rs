// crates/sdk-test-helpers/src/httptest/mod.rs
// ============================================================================
// Module: Embedded HTTP Test Server
// Description: Local HTTP/HTTPS server with scripted handlers and recording.
// Purpose: Test HTTP clients against real sockets without external services.
// Dependencies: axum, axum-server, rustls, tokio
// ============================================================================

//! ## Overview
//! Start an [`HttpServer`] with a [`Handler`], point the client under test at
//! [`HttpServer::uri`], then inspect what arrived through
//! [`HttpServer::recorder`].
//!
//! - [`handlers`] holds canned responses, delays, chunked streams, and SSE.
//! - [`SimpleRouter`] dispatches by path and method.
//! - [`HandlerSwitcher`] changes behavior while the server is running.
//! - [`ServerTlsConfig`] serves HTTPS with a generated certificate.

pub mod events;
pub mod handlers;

mod context;
mod handler;
mod recorder;
mod request;
mod router;
mod server;
mod switcher;
mod tls;

pub use context::RequestContext;
pub use handler::Handler;
pub use handler::HandlerError;
pub use recorder::DEFAULT_TIMEOUT;
pub use recorder::RecorderError;
pub use recorder::RequestRecorder;
pub use request::RequestInfo;
pub use router::RouterError;
pub use router::SimpleRouter;
pub use server::DEFAULT_SHUTDOWN_GRACE;
pub use server::HttpServer;
pub use server::HttpServerBuilder;
pub use server::HttpServerError;
pub use switcher::HandlerSwitcher;
pub use tls::ServerTlsConfig;
pub use tls::TlsError;
