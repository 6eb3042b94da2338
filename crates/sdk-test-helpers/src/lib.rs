// crates/sdk-test-helpers/src/lib.rs
// ============================================================================
// Module: SDK Test Helpers
// Description: Shared test utilities for SDK test suites.
// Purpose: Provide embedded HTTP servers, request capture, and assertions.
// Dependencies: axum, axum-server, tokio, rustls, rcgen, serde_json, regex
// ============================================================================

//! ## Overview
//! This crate bundles the helpers SDK test suites need when exercising
//! network clients against a controlled peer:
//! - [`httptest`]: an embedded HTTP/HTTPS server with composable handlers,
//!   request recording, routing, chunked and SSE streaming, and self-signed
//!   TLS fixtures.
//! - [`json`]: JSON equality and subset assertions with path-level diffs.
//! - [`concurrent`] and [`assertions`]: timing-aware assertions for channels,
//!   futures, and polled conditions.
//! - [`type_behavior`]: a contract checker for `PartialEq`/`Hash` impls.
//!
//! Invariants:
//! - Assertion helpers return [`AssertionFailure`] instead of panicking so
//!   callers decide whether to propagate or unwrap.
//! - Servers shut down on [`httptest::HttpServer::close`] or drop, releasing
//!   handlers that are blocked waiting for the connection to end.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assertions;
pub mod concurrent;
pub mod config;
pub mod error;
pub mod httptest;
pub mod json;
pub mod type_behavior;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use assertions::assert_polled_function_returns_value;
pub use concurrent::assert_future_completes;
pub use concurrent::assert_future_does_not_complete;
pub use concurrent::assert_no_more_values;
pub use concurrent::await_value;
pub use config::ConfigError;
pub use config::resolve_timeout;
pub use error::AssertionFailure;
pub use json::assert_json_eq;
pub use json::assert_json_subset;
pub use type_behavior::ValueFactory;
pub use type_behavior::check_eq_and_hash;
pub use type_behavior::value_factory_from_instances;
