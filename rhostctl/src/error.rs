//! Error handling module for the rhostctl CLI.
//!
//! Custom error types using `thiserror`; embedding errors are wrapped
//! unchanged so their messages reach the user as-is.

use rhost_embed::EmbedError;
use thiserror::Error;

/// Main error type for the rhostctl CLI application.
#[derive(Error, Debug)]
pub enum CtlError {
    /// Configuration file missing, unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the embedding core.
    #[error(transparent)]
    Embed(#[from] EmbedError),

    /// Requested behavior is not available in this build.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using CtlError.
pub type Result<T> = std::result::Result<T, CtlError>;
