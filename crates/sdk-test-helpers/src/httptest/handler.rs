// crates/sdk-test-helpers/src/httptest/handler.rs
// ============================================================================
// Module: Handler Type
// Description: Shareable request handler and its failure modes.
// Purpose: Give every test server component one composable callback type.
// Dependencies: thiserror
// ============================================================================

//! The [`Handler`] callback type and [`HandlerError`].

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::httptest::context::RequestContext;

/// Reasons a handler stops before completing its response.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The request was malformed; answered with status 400.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The client disconnected while the response was being written.
    #[error("client disconnected")]
    Disconnected,
    /// The handler failed; answered with status 500 if nothing was sent yet.
    #[error("handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    /// Returns the status used when the failure happens before the head is sent.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Disconnected | Self::Failed(_) => 500,
        }
    }
}

/// Signature shared by all handlers.
type HandlerFn = dyn Fn(&mut RequestContext) -> Result<(), HandlerError> + Send + Sync;

/// Callback that produces an HTTP response.
///
/// Handlers are cheap to clone and may run concurrently for simultaneous
/// requests. Compose them with the functions in
/// [`handlers`](crate::httptest::handlers).
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    /// Wraps a closure as a handler.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    /// Runs the handler against a request.
    ///
    /// # Errors
    ///
    /// Returns whatever [`HandlerError`] the wrapped closure reports.
    pub fn apply(&self, context: &mut RequestContext) -> Result<(), HandlerError> {
        (self.0)(context)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use super::Handler;
    use super::HandlerError;
    use crate::httptest::context::tests::context_for;
    use crate::httptest::context::tests::finish;

    #[test]
    fn error_statuses() {
        assert_eq!(HandlerError::BadRequest("x".to_string()).status(), 400);
        assert_eq!(HandlerError::Failed("x".to_string()).status(), 500);
        assert_eq!(HandlerError::Disconnected.status(), 500);
    }

    #[test]
    fn cloned_handlers_share_the_callback() {
        let handler = Handler::new(|ctx| {
            ctx.set_status(204);
            Ok(())
        });
        let copy = handler.clone();
        let (mut context, head, _) = context_for("GET", "/");
        copy.apply(&mut context).unwrap();
        let (status, _, _) = finish(context, head);
        assert_eq!(status, 204);
    }
}
