//! Error propagation policies.
//!
//! Two policies exist side by side:
//!
//! - [`ErrorPolicy::Capture`]: the failure is recorded in hook state and the
//!   call yields `None`. Used by [`AsyncOperation`](crate::AsyncOperation),
//!   [`Fetcher`](crate::Fetcher), [`QueryHook`](crate::QueryHook) and
//!   [`MutationHook`](crate::MutationHook).
//! - [`ErrorPolicy::Propagate`]: the failure is recorded and the original
//!   error is returned to the caller. Used by [`Mutator`](crate::Mutator).

use std::fmt::Display;

/// Message stored when an error renders as an empty string.
pub const FALLBACK_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// How a failed operation reaches its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Record the error in state and return `None`.
    #[default]
    Capture,
    /// Record the error in state and return it.
    Propagate,
}

/// Per-call execution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Toggle `loading` around the call.
    pub show_loading: bool,
    /// Failure propagation.
    pub policy: ErrorPolicy,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            show_loading: true,
            policy: ErrorPolicy::Capture,
        }
    }
}

impl ExecuteOptions {
    /// Capture policy without touching `loading` (background refreshes).
    pub fn silent() -> Self {
        Self {
            show_loading: false,
            ..Default::default()
        }
    }

    /// Set whether `loading` is toggled.
    pub fn show_loading(mut self, show_loading: bool) -> Self {
        self.show_loading = show_loading;
        self
    }

    /// Set the error policy.
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Render an error for display, substituting [`FALLBACK_ERROR_MESSAGE`]
/// when it has no message.
pub fn error_message(err: &dyn Display) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_message(&"boom"), "boom");
        assert_eq!(error_message(&""), FALLBACK_ERROR_MESSAGE);
        assert_eq!(error_message(&"  \n"), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_execute_options() {
        let defaults = ExecuteOptions::default();
        assert!(defaults.show_loading);
        assert_eq!(defaults.policy, ErrorPolicy::Capture);

        let silent = ExecuteOptions::silent().policy(ErrorPolicy::Propagate);
        assert!(!silent.show_loading);
        assert_eq!(silent.policy, ErrorPolicy::Propagate);
    }
}
