// crates/sdk-test-helpers/src/httptest/request.rs
// ============================================================================
// Module: Request Snapshot
// Description: Fully-read, recordable view of an incoming HTTP request.
// Purpose: Let handlers and recorders inspect requests after the fact.
// Dependencies: bytes, url
// ============================================================================

//! Recorded request snapshot.

use std::borrow::Cow;
use std::collections::BTreeMap;

use bytes::Bytes;
use url::Url;

/// Properties of a request received by an
/// [`HttpServer`](crate::httptest::HttpServer).
///
/// The body is read in full before any handler runs, so the same snapshot can
/// be recorded and inspected later.
///
/// # Invariants
/// - `method` is uppercase.
/// - Header names are stored lowercase; values keep arrival order.
/// - `query` includes the leading `?` when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// Uppercase HTTP method.
    method: String,
    /// Full request URI.
    uri: Url,
    /// Request path.
    path: String,
    /// Query string with leading `?`, if any.
    query: Option<String>,
    /// Lowercase header names mapped to their values.
    headers: BTreeMap<String, Vec<String>>,
    /// Request body.
    body: Bytes,
}

impl RequestInfo {
    /// Builds a snapshot from already-parsed request parts.
    ///
    /// `uri` should be the full URI the client requested; `path` and `query`
    /// are taken from it.
    #[must_use]
    pub fn new<I, N, V>(method: &str, uri: Url, headers: I, body: Bytes) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<String>,
    {
        let mut header_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in headers {
            header_map.entry(name.as_ref().to_ascii_lowercase()).or_default().push(value.into());
        }
        Self {
            method: method.to_ascii_uppercase(),
            path: uri.path().to_string(),
            query: uri.query().map(|query| format!("?{query}")),
            uri,
            headers: header_map,
            body,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the full request URI.
    #[must_use]
    pub const fn uri(&self) -> &Url {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query string, including the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).first().map(String::as_str)
    }

    /// Returns every value of a header in arrival order.
    #[must_use]
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers.get(&name.to_ascii_lowercase()).map_or(&[], Vec::as_slice)
    }

    /// Returns all header names, lowercase.
    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.headers.keys().map(String::as_str)
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the request body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
