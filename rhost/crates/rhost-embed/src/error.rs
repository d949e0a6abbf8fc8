//! Error Module - Embedding Error Types
//!
//! Defines all error types used by the embedding core.
//!
//! # Error Categories
//!
//! ## State Errors
//! - `NotReady` - Runtime touched before (or after) its usable lifetime
//! - `AlreadyInitialized` - Startup options mutated after bootstrap
//! - `ReinitializationUnsupported` - Bootstrap requested after shutdown
//!
//! ## Caller Errors
//! - `InvalidOption` - Option cannot be passed to the bootstrap entry point
//! - `CallbackMismatch` - Callback signature does not belong to the slot
//!
//! ## Environment Errors
//! - `RHomeNotFound` - No R installation could be located
//! - `Configuration` - Invalid embedding configuration
//! - `CallbackUnavailable` - Interface mode cannot supply the console callbacks
//!
//! Malformed session markers are deliberately absent: they are reported
//! as warnings by the session coordinator and never surface as errors.

use crate::callbacks::CallbackSlot;
use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for all embedding operations
///
/// # Examples
///
/// ```rust
/// use rhost_embed::EmbedError;
///
/// fn describe(err: &EmbedError) -> &'static str {
///     match err {
///         EmbedError::NotReady => "initialize R first",
///         EmbedError::AlreadyInitialized => "options are locked",
///         _ => "other",
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The embedded runtime is not ready to use
    ///
    /// **When returned:** A runtime-touching operation ran before
    /// initialization, while R is busy, or after shutdown
    ///
    /// **Recovery strategy:** Initialize, then retry
    #[error("The embedded R is not ready to use")]
    NotReady,

    /// Startup options mutated after initialization
    ///
    /// **When returned:** `InitOptions::set` once the bootstrap ran
    ///
    /// **Recovery strategy:** None, this is a caller error
    #[error("Options can no longer be set once R is initialized")]
    AlreadyInitialized,

    /// Initialization requested after the runtime ended
    ///
    /// **When returned:** `initialize` after `shutdown`
    ///
    /// **Recovery strategy:** None, R cannot be restarted in-process
    #[error("R has ended; re-initialization in the same process is not supported")]
    ReinitializationUnsupported,

    /// Startup option cannot be marshaled
    ///
    /// **Example scenarios:**
    /// - Interior NUL byte
    /// - Non-ASCII characters
    #[error("Invalid startup option {option:?}: {reason}")]
    InvalidOption { option: String, reason: String },

    /// Callback signature does not match the slot it is bound to
    #[error("Callback for {actual} cannot be bound to slot {slot}")]
    CallbackMismatch {
        slot: CallbackSlot,
        actual: CallbackSlot,
    },

    /// No R installation found
    ///
    /// **When returned:** Neither configuration, `R_HOME`, nor `R RHOME`
    /// yields a directory
    #[error("Unable to determine R home: {0}")]
    RHomeNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Callback source has no implementation for a slot R needs bound
    ///
    /// **When returned:** `initialize` before bootstrap, typically with
    /// `InterfaceMode::Api` on a backend without compiled-in callbacks
    ///
    /// **Recovery strategy:** Use `InterfaceMode::Abi` or skip callbacks
    #[error("{provider} callbacks have no implementation for {slot}")]
    CallbackUnavailable {
        provider: &'static str,
        slot: CallbackSlot,
    },
}

impl EmbedError {
    /// Check if retrying after corrective action can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EmbedError::NotReady | EmbedError::RHomeNotFound(_))
    }

    /// Check if this error is the caller's fault
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            EmbedError::AlreadyInitialized
                | EmbedError::ReinitializationUnsupported
                | EmbedError::InvalidOption { .. }
                | EmbedError::CallbackMismatch { .. }
        )
    }
}

/// Result type alias for embedding operations
pub type Result<T> = std::result::Result<T, EmbedError>;
