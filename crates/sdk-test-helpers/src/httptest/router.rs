// crates/sdk-test-helpers/src/httptest/router.rs
// ============================================================================
// Module: Simple Router
// Description: Path and method dispatch for test server handlers.
// Purpose: Serve several endpoints from one test server.
// Dependencies: regex, thiserror
// ============================================================================

//! ## Overview
//! Routes are tried in the order they were added; the first whose path
//! matches and whose method (if any) matches handles the request.
//!
//! Invariants:
//! - No path match answers 404.
//! - A path match for other methods only answers 405.
//! - Regex routes must match the whole path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use thiserror::Error;

use crate::httptest::context::RequestContext;
use crate::httptest::handler::Handler;
use crate::httptest::handler::HandlerError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Route registration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The path pattern is not a valid regex.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Pattern as given.
        pattern: String,
        /// Regex compiler message.
        reason: String,
    },
}

// ============================================================================
// SECTION: Routes
// ============================================================================

/// How a route matches a request path.
#[derive(Clone)]
enum PathMatcher {
    /// Literal path equality.
    Exact(String),
    /// Anchored regex; capture groups become path parameters.
    Pattern(Regex),
}

impl PathMatcher {
    /// Returns the captured parameters if `path` matches.
    fn captures(&self, path: &str) -> Option<Vec<String>> {
        match self {
            Self::Exact(expected) => (expected == path).then(Vec::new),
            Self::Pattern(regex) => regex.captures(path).map(|captures| {
                captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect()
            }),
        }
    }
}

/// One registered route.
#[derive(Clone)]
struct Route {
    /// Uppercase method filter, or `None` for any method.
    method: Option<String>,
    /// Path matcher.
    matcher: PathMatcher,
    /// Route target.
    handler: Handler,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Dispatches requests to handlers by path and method.
#[derive(Clone, Default)]
pub struct SimpleRouter {
    /// Routes in registration order.
    routes: Vec<Route>,
}

impl SimpleRouter {
    /// Creates a router with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exact-match path for any method.
    #[must_use]
    pub fn add(self, path: &str, handler: Handler) -> Self {
        self.push(None, PathMatcher::Exact(path.to_string()), handler)
    }

    /// Adds an exact-match path for one method.
    #[must_use]
    pub fn add_method(self, method: &str, path: &str, handler: Handler) -> Self {
        self.push(Some(method), PathMatcher::Exact(path.to_string()), handler)
    }

    /// Adds a regex path pattern for any method.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] if `pattern` does not compile.
    pub fn add_regex(self, pattern: &str, handler: Handler) -> Result<Self, RouterError> {
        let matcher = compile(pattern)?;
        Ok(self.push(None, matcher, handler))
    }

    /// Adds a regex path pattern for one method.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] if `pattern` does not compile.
    pub fn add_regex_method(
        self,
        method: &str,
        pattern: &str,
        handler: Handler,
    ) -> Result<Self, RouterError> {
        let matcher = compile(pattern)?;
        Ok(self.push(Some(method), matcher, handler))
    }

    /// Returns a handler that dispatches through this router.
    #[must_use]
    pub fn handler(&self) -> Handler {
        let router = self.clone();
        Handler::new(move |ctx| router.dispatch(ctx))
    }

    /// Appends a route.
    fn push(mut self, method: Option<&str>, matcher: PathMatcher, handler: Handler) -> Self {
        self.routes.push(Route {
            method: method.map(str::to_ascii_uppercase),
            matcher,
            handler,
        });
        self
    }

    /// Routes one request.
    fn dispatch(&self, ctx: &mut RequestContext) -> Result<(), HandlerError> {
        let mut matched_path = false;
        for route in &self.routes {
            let Some(params) = route.matcher.captures(ctx.request().path()) else {
                continue;
            };
            matched_path = true;
            let method = ctx.request().method();
            let allowed =
                route.method.as_deref().is_none_or(|want| want.eq_ignore_ascii_case(method));
            if !allowed {
                continue;
            }
            if !params.is_empty() {
                ctx.set_path_params(params);
            }
            return route.handler.apply(ctx);
        }
        ctx.set_status(if matched_path { 405 } else { 404 });
        Ok(())
    }
}

impl From<SimpleRouter> for Handler {
    fn from(router: SimpleRouter) -> Self {
        Self::new(move |ctx| router.dispatch(ctx))
    }
}

/// Compiles a whole-path regex.
fn compile(pattern: &str) -> Result<PathMatcher, RouterError> {
    Regex::new(&format!("^(?:{pattern})$")).map(PathMatcher::Pattern).map_err(|err| {
        RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        }
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
