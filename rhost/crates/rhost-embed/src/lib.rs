//! # rhost-embed - Embedded R Lifecycle Core
//!
//! Hosts the R interpreter inside another process. This crate is the only
//! place where R's process-wide, non-reentrant native state is created and
//! torn down; everything downstream (object wrappers, value conversion)
//! assumes R is already running.
//!
//! ## Overview
//!
//! - **Once-only bootstrap**: R can be initialized at most once per process
//!   and never again after it ended
//! - **Callback table**: console and lifecycle hooks wired into R's
//!   `ptr_R_*` globals, from Rust trampolines or from a native interface
//!   library
//! - **Status tracking**: initialized / busy / ended flags, readable from any
//!   thread
//! - **Session coordination**: detection of an R session already started in
//!   this process, and publication of our own marker
//! - **Clean shutdown**: R's exit hooks in order, then the end of the session
//!
//! ## Quick Start
//!
//! ```rust
//! use rhost_embed::{EmbedConfig, RecordingRuntime, RuntimeHandle, ShutdownOutcome};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), rhost_embed::EmbedError> {
//!     let config = EmbedConfig {
//!         r_home: Some(std::env::temp_dir()),
//!         ..Default::default()
//!     };
//!     let runtime = RuntimeHandle::with_config(Arc::new(RecordingRuntime::new()), config)?;
//!
//!     runtime.set_options(["myhost", "--quiet", "--vanilla"])?;
//!     runtime.initialize(false, false)?;
//!     runtime.assert_ready()?;
//!
//!     assert_eq!(runtime.shutdown(0)?, ShutdownOutcome::Ended);
//!     assert_eq!(runtime.shutdown(0)?, ShutdownOutcome::AlreadyEnded);
//!     Ok(())
//! }
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//!   {}  ──initialize──▶  {initialized}  ◀──busy──▶  {initialized, busy}
//!                             │
//!                          shutdown
//!                             ▼
//!                    {initialized, ended}   (terminal)
//! ```
//!
//! ## Backends
//!
//! | Backend | Feature | Use |
//! |---------|---------|-----|
//! | [`LibR`](native::LibR) | `libr` | Links `libR` |
//! | [`RecordingRuntime`] | always | Tests, dry runs |
//!
//! ## Thread Safety
//!
//! - [`RuntimeHandle`] is `Send + Sync`; initialization and shutdown
//!   serialize on the embedding lock of the backend's [`Instance`], which
//!   every handle on that backend shares
//! - R itself is single-threaded: hold [`RuntimeHandle::lock`] around any
//!   call into R made from outside the bootstrap thread
//!
//! ## Modules
//!
//! - [`callbacks`]: Callback slots, sources and the installation table
//! - [`config`]: Embedding configuration and R home resolution
//! - [`console`]: Console handler receiving R's callbacks
//! - [`error`]: Error types
//! - [`logging`]: Lifecycle event journal
//! - [`native`]: Native runtime interface and backends
//! - [`options`]: Startup options
//! - [`runtime`]: Initialization and shutdown sequencers
//! - [`session`]: Session markers in the process environment
//! - [`status`]: Status flags

pub mod callbacks;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod native;
pub mod options;
pub mod runtime;
pub mod session;
pub mod status;

pub use callbacks::{
    CallbackSlot, CallbackSource, NativeSource, ResolvedTable, SlotBinding, TrampolineSource,
};
pub use config::{EmbedConfig, InterfaceMode};
pub use console::{set_console, Console, StdConsole};
pub use error::{EmbedError, Result};
pub use logging::{EmbedEvent, EventLog};
pub use native::{NativeCall, NativeRuntime, RecordingRuntime};
pub use runtime::{InitOutcome, Instance, RuntimeHandle, ShutdownOutcome};
pub use session::SessionStatus;
pub use status::RuntimeStatus;

/// rhost-embed version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Handle on the linked libR, configured from the environment
///
/// See [`EmbedConfig::from_env`] for the variables read.
///
/// # Examples
///
/// ```rust,no_run
/// let runtime = rhost_embed::init()?;
/// runtime.start()?;
/// runtime.shutdown(0)?;
/// # Ok::<(), rhost_embed::EmbedError>(())
/// ```
#[cfg(feature = "libr")]
pub fn init() -> Result<RuntimeHandle> {
    init_with_config(EmbedConfig::from_env())
}

/// Handle on the linked libR with custom configuration
///
/// Handles share the process-wide [`Instance`]: once one has started R, the
/// others report `AlreadyInitialized`.
#[cfg(feature = "libr")]
pub fn init_with_config(config: EmbedConfig) -> Result<RuntimeHandle> {
    RuntimeHandle::with_config(std::sync::Arc::new(native::LibR::new()), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuntimeHandle>();
        assert_send_sync::<Instance>();
    }
}
