//! Error types for the core crate.

use thiserror::Error;

/// Errors raised by core primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A task was spawned on a scope that has already unmounted.
    #[error("scope {0} has already unmounted")]
    ScopeUnmounted(u64),

    /// A stored value could not be parsed into the requested type.
    #[error("invalid value for '{key}': {message}")]
    Parse { key: String, message: String },

    /// The tracing subscriber could not be installed.
    #[error("failed to install tracing subscriber: {0}")]
    Logging(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
