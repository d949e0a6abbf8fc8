//! Runtime Module - Embedded R Lifecycle
//!
//! [`RuntimeHandle`] drives the embedded R through a native backend. What
//! must exist once per R lives in the backend's [`Instance`]:
//! - The embedding lock
//! - Status flags
//! - Whether the session was started by someone else
//!
//! Handles on the same backend share it, so a second handle sees R as
//! already running. Initialization and shutdown live in [`init`] and
//! [`shutdown`]; both run as one critical section under the embedding lock.

pub mod environments;
pub mod init;
pub mod shutdown;

pub use environments::WellKnownEnvironments;

use crate::config::EmbedConfig;
use crate::error::Result;
use crate::logging::{EmbedEvent, EventLog};
use crate::native::NativeRuntime;
use crate::options::InitOptions;
use crate::status::{RuntimeStatus, StatusRegistry};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Result of [`RuntimeHandle::initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InitOutcome {
    /// Bootstrap ran; `status` is what the entry point returned
    Started { status: i32 },
    /// Already running; nothing was done
    AlreadyInitialized,
    /// R was started by this process before us; bootstrap skipped
    External,
}

/// Result of [`RuntimeHandle::shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShutdownOutcome {
    /// Exit hooks ran and R ended
    Ended,
    /// R had already ended; nothing was done
    AlreadyEnded,
    /// R was never initialized; nothing was done
    NotStarted,
    /// R belongs to someone else; marked ended without running exit hooks
    Detached,
}

static PROCESS_INSTANCE: OnceLock<Arc<Instance>> = OnceLock::new();

/// Instance - lifecycle state of one R
///
/// R can be initialized once per process. Every [`RuntimeHandle`] on the
/// same backend shares its instance, see [`NativeRuntime::instance`].
#[derive(Debug, Default)]
pub struct Instance {
    lock: ReentrantMutex<()>,
    status: Arc<StatusRegistry>,
    external: AtomicBool,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance of the R linked into this process
    pub fn process() -> &'static Arc<Instance> {
        PROCESS_INSTANCE.get_or_init(|| Arc::new(Instance::new()))
    }
}

/// RuntimeHandle - the embedded R runtime
///
/// Share it with `Arc`; every method takes `&self`. Further handles on the
/// same backend are allowed and see the same lifecycle.
///
/// # Examples
///
/// ```rust
/// use rhost_embed::{EmbedConfig, InitOutcome, RecordingRuntime, RuntimeHandle};
/// use std::sync::Arc;
///
/// let config = EmbedConfig {
///     r_home: Some(std::env::temp_dir()),
///     ..Default::default()
/// };
/// let runtime = RuntimeHandle::with_config(Arc::new(RecordingRuntime::new()), config).unwrap();
///
/// runtime.set_options(["myhost", "--vanilla"]).unwrap();
/// let outcome = runtime.initialize(false, false).unwrap();
/// assert_eq!(outcome, InitOutcome::Started { status: 0 });
/// assert!(runtime.is_ready());
/// ```
pub struct RuntimeHandle {
    native: Arc<dyn NativeRuntime>,
    config: EmbedConfig,
    instance: Arc<Instance>,
    options: InitOptions,
    environments: WellKnownEnvironments,
    events: EventLog,
}

impl RuntimeHandle {
    /// Create handle with default configuration
    pub fn new(native: Arc<dyn NativeRuntime>) -> Self {
        Self::build(native, EmbedConfig::default())
    }

    /// Create handle with custom configuration
    ///
    /// # Errors
    /// `Configuration` if the configuration does not validate.
    pub fn with_config(native: Arc<dyn NativeRuntime>, config: EmbedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(native, config))
    }

    fn build(native: Arc<dyn NativeRuntime>, config: EmbedConfig) -> Self {
        let options = InitOptions::with_options(config.options.clone());
        let instance = native.instance().clone();
        Self {
            native,
            config,
            instance,
            options,
            environments: WellKnownEnvironments::new(),
            events: EventLog::new(),
        }
    }

    /// Hold the embedding lock
    ///
    /// Reentrant: code running under the guard may call back into the
    /// handle on the same thread.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.instance.lock.lock()
    }

    /// Start R with the configured interactivity and callback policy
    pub fn start(&self) -> Result<InitOutcome> {
        self.initialize(self.config.interactive, self.config.install_callbacks)
    }

    /// Current startup options
    pub fn options(&self) -> Vec<String> {
        self.options.get()
    }

    /// Replace the startup options
    ///
    /// # Errors
    /// - `AlreadyInitialized` once R was initialized
    /// - `InvalidOption` if an option cannot be marshaled
    pub fn set_options<I, S>(&self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _guard = self.lock();
        self.options.set(&self.instance.status, options)?;
        self.events.log(EmbedEvent::OptionsChanged {
            options: self.options.get(),
        });
        Ok(())
    }

    pub fn status(&self) -> RuntimeStatus {
        self.instance.status.snapshot()
    }

    pub fn status_registry(&self) -> &Arc<StatusRegistry> {
        &self.instance.status
    }

    pub fn is_initialized(&self) -> bool {
        self.instance.status.is_initialized()
    }

    pub fn is_ready(&self) -> bool {
        self.instance.status.is_ready()
    }

    /// Fail with `NotReady` unless R is ready
    pub fn assert_ready(&self) -> Result<()> {
        self.instance.status.assert_ready()
    }

    /// Was the running session started by someone else in this process
    pub fn is_external(&self) -> bool {
        self.instance.external.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    pub fn native(&self) -> &dyn NativeRuntime {
        self.native.as_ref()
    }

    pub fn environments(&self) -> &WellKnownEnvironments {
        &self.environments
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbedError;
    use crate::native::RecordingRuntime;

    fn handle() -> RuntimeHandle {
        let config = EmbedConfig {
            r_home: Some(std::env::temp_dir()),
            session_marker_var: "RHOST_TEST_UNSET_MARKER".to_string(),
            ..Default::default()
        };
        RuntimeHandle::with_config(Arc::new(RecordingRuntime::new()), config).unwrap()
    }

    #[test]
    fn test_new_handle() {
        let runtime = handle();
        assert_eq!(runtime.status(), RuntimeStatus::UNINITIALIZED);
        assert_eq!(runtime.options(), vec!["rhost", "--quiet", "--no-save"]);
        assert!(!runtime.is_external());
    }

    #[test]
    fn test_with_config_validates() {
        let config = EmbedConfig {
            options: Vec::new(),
            ..Default::default()
        };
        let result = RuntimeHandle::with_config(Arc::new(RecordingRuntime::new()), config);
        assert!(matches!(result, Err(EmbedError::Configuration(_))));
    }

    #[test]
    fn test_set_options_logs_event() {
        let runtime = handle();
        runtime.set_options(["prog", "--vanilla"]).unwrap();
        assert_eq!(runtime.options(), vec!["prog", "--vanilla"]);
        assert_eq!(
            runtime.events().events(),
            vec![EmbedEvent::OptionsChanged {
                options: vec!["prog".to_string(), "--vanilla".to_string()]
            }]
        );
    }

    #[test]
    fn test_lock_is_reentrant() {
        let runtime = handle();
        let _outer = runtime.lock();
        let _inner = runtime.lock();
        assert!(runtime.initialize(false, false).is_ok());
    }

    #[test]
    fn test_handles_share_backend_instance() {
        let native = Arc::new(RecordingRuntime::new());
        let config = handle().config().clone();
        let first = RuntimeHandle::with_config(native.clone(), config.clone()).unwrap();
        let second = RuntimeHandle::with_config(native, config).unwrap();

        first.initialize(false, false).unwrap();
        assert!(second.is_ready());
        assert!(Arc::ptr_eq(first.status_registry(), second.status_registry()));
    }

    #[test]
    fn test_process_instance_is_unique() {
        assert!(Arc::ptr_eq(Instance::process(), Instance::process()));
    }

    #[test]
    fn test_set_options_waits_for_initialize() {
        let runtime = handle();
        let guard = runtime.lock();

        std::thread::scope(|scope| {
            let setter = scope.spawn(|| runtime.set_options(["late", "--vanilla"]));

            // Give the setter time to reach the lock while bootstrap runs.
            std::thread::sleep(std::time::Duration::from_millis(50));
            runtime.initialize(false, false).unwrap();
            drop(guard);

            let result = setter.join().unwrap();
            assert!(matches!(result, Err(EmbedError::AlreadyInitialized)));
        });
        assert_eq!(runtime.options(), vec!["rhost", "--quiet", "--no-save"]);
    }

    #[test]
    fn test_outcome_json() {
        let json = serde_json::to_value(InitOutcome::Started { status: 0 }).unwrap();
        assert_eq!(json["outcome"], "started");
        assert_eq!(json["status"], 0);

        let json = serde_json::to_value(ShutdownOutcome::AlreadyEnded).unwrap();
        assert_eq!(json["outcome"], "already_ended");
    }
}
