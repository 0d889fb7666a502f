//! Startup error types for the Lorekeeper client.

use lorekeeper_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the client binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A domain operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Terminal I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
