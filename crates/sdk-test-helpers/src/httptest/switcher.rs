// crates/sdk-test-helpers/src/httptest/switcher.rs
// ============================================================================
// Module: Handler Switcher
// Description: Delegating handler whose target can change at runtime.
// Purpose: Change server behavior mid-test without restarting the server.
// Dependencies: none
// ============================================================================

//! Runtime-replaceable handler target.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::httptest::handler::Handler;

/// Forwards requests to a replaceable target handler.
///
/// Clones share the same target. Requests already running keep the handler
/// they started with.
#[derive(Clone)]
pub struct HandlerSwitcher {
    /// Current target.
    target: Arc<RwLock<Handler>>,
}

impl HandlerSwitcher {
    /// Creates a switcher that initially forwards to `initial`.
    #[must_use]
    pub fn new(initial: Handler) -> Self {
        Self {
            target: Arc::new(RwLock::new(initial)),
        }
    }

    /// Replaces the target for subsequent requests.
    pub fn set_target(&self, handler: Handler) {
        *self.target.write().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// Returns the current target.
    #[must_use]
    pub fn target(&self) -> Handler {
        self.target.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns a handler that forwards to whatever the target is when a
    /// request arrives.
    #[must_use]
    pub fn handler(&self) -> Handler {
        let switcher = self.clone();
        Handler::new(move |ctx| switcher.target().apply(ctx))
    }
}
