//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A requested resource (NPC, scenario) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A validation error in client logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend failed or could not be reached.
    #[error("backend error during {operation}: {message}")]
    Backend {
        /// The backend operation that failed.
        operation: &'static str,
        /// Human-readable failure detail.
        message: String,
    },

    /// Reading or writing persisted client state failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Shorthand for a [`DomainError::Backend`] failure.
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }
}
