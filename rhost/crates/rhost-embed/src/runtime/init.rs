//! Runtime Initialization
//!
//! Bootstrap sequence, run once per process under the embedding lock:
//! 1. Reject re-entry (already running, or already ended)
//! 2. Detect a session started earlier by this process
//! 3. Resolve R home, options and the callback table; nothing is touched yet
//! 4. Publish `R_HOME`
//! 5. Call the bootstrap entry point with the startup options
//! 6. Mark initialized
//! 7. Detach R from the terminal: console files, signal handlers, interactivity
//! 8. Install the callback table
//! 9. Lift the C stack limit
//! 10. Set up the main loop
//!
//! Every fallible step runs before step 5.

use super::{InitOutcome, RuntimeHandle};
use crate::callbacks::{CallbackSource, NativeSource, ResolvedTable, TrampolineSource};
use crate::config::InterfaceMode;
use crate::error::{EmbedError, Result};
use crate::logging::EmbedEvent;
use crate::session::{publish_process_info_to, SessionStatus};
use std::sync::atomic::Ordering;

/// Value written to `R_CStackLimit` to disable R's stack checking
pub const UNLIMITED_CSTACK: usize = usize::MAX;

impl RuntimeHandle {
    /// Initialize the embedded R
    ///
    /// # Arguments
    /// * `interactive` - value for `R_Interactive`
    /// * `want_callbacks` - install the callback table
    ///
    /// # Returns
    /// - `Started` after a bootstrap
    /// - `AlreadyInitialized` if R is running
    /// - `External` if R was started by this process before this handle
    ///
    /// # Errors
    /// - `ReinitializationUnsupported` after shutdown
    /// - `RHomeNotFound` if no R installation is found; nothing was changed
    /// - `InvalidOption` if the options cannot be marshaled
    /// - `CallbackUnavailable` or `CallbackMismatch` if the interface mode
    ///   cannot supply a valid callback table
    ///
    /// On error nothing native has been called.
    pub fn initialize(&self, interactive: bool, want_callbacks: bool) -> Result<InitOutcome> {
        let _guard = self.lock();

        let status = self.instance.status.snapshot();
        if status.ended {
            self.events.log(EmbedEvent::ReinitializationRejected);
            return Err(EmbedError::ReinitializationUnsupported);
        }
        if status.initialized {
            return Ok(InitOutcome::AlreadyInitialized);
        }

        if SessionStatus::from_env_var(&self.config.session_marker_var).is_externally_initialized()
        {
            self.instance.external.store(true, Ordering::SeqCst);
            self.instance.status.mark_initialized();
            self.events.log(EmbedEvent::ExternalSession {
                marker_var: self.config.session_marker_var.clone(),
            });
            return Ok(InitOutcome::External);
        }

        let r_home = self.config.resolve_r_home()?;
        let mut args = self.options.to_c_args()?;
        let callbacks = if want_callbacks {
            Some(self.resolve_callbacks()?)
        } else {
            None
        };

        std::env::set_var("R_HOME", &r_home);
        self.events.log(EmbedEvent::BootstrapStarted {
            argc: args.strings().len(),
            r_home: r_home.display().to_string(),
        });

        let code = self.native.initialize_r(&mut args);
        self.instance.status.mark_initialized();
        self.events.log(EmbedEvent::BootstrapCompleted { status: code });

        self.native.unset_console_files();
        self.native.set_signal_handlers(false);
        self.native.set_interactive(interactive);

        match callbacks {
            Some(table) => self.install_callbacks(&table),
            None => self.events.log(EmbedEvent::CallbacksSkipped),
        }

        self.native.set_cstack_limit(UNLIMITED_CSTACK);
        self.native.setup_main_loop();
        self.events.log(EmbedEvent::MainLoopReady);

        let marker = publish_process_info_to(&self.config.publish_var);
        self.events.log(EmbedEvent::ProcessInfoPublished {
            var: self.config.publish_var.clone(),
            marker,
        });

        Ok(InitOutcome::Started { status: code })
    }

    fn resolve_callbacks(&self) -> Result<ResolvedTable> {
        let source: Box<dyn CallbackSource + '_> = match self.config.interface_mode {
            InterfaceMode::Abi => Box::new(TrampolineSource::new(&self.instance.status)),
            InterfaceMode::Api => Box::new(NativeSource::new(self.native.as_ref())),
        };
        ResolvedTable::resolve(source.as_ref())
    }

    fn install_callbacks(&self, table: &ResolvedTable) {
        table.install(self.native.as_ref());
        for (slot, binding) in table.bindings() {
            self.events.log(EmbedEvent::CallbackBound {
                slot: *slot,
                runtime_default: binding.is_runtime_default(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{CallbackFn, CallbackImpl, CallbackSlot};
    use crate::config::EmbedConfig;
    use crate::native::{NativeCall, NativeRuntime, RecordingRuntime};
    use std::sync::Arc;

    fn handle(native: &Arc<RecordingRuntime>, config: EmbedConfig) -> RuntimeHandle {
        let config = EmbedConfig {
            r_home: Some(std::env::temp_dir()),
            session_marker_var: "RHOST_INIT_TEST_MARKER".to_string(),
            publish_var: "RHOST_INIT_TEST_PUBLISHED".to_string(),
            ..config
        };
        RuntimeHandle::with_config(native.clone(), config).unwrap()
    }

    #[test]
    fn test_bootstrap_sequence_without_callbacks() {
        let native = Arc::new(RecordingRuntime::new().with_bootstrap_status(0));
        let runtime = handle(&native, EmbedConfig::default());

        let outcome = runtime.initialize(true, false).unwrap();
        assert_eq!(outcome, InitOutcome::Started { status: 0 });
        assert!(runtime.is_ready());

        let calls = native.calls();
        assert!(matches!(calls[0], NativeCall::InitializeR { .. }));
        assert_eq!(
            &calls[1..],
            &[
                NativeCall::UnsetConsoleFiles,
                NativeCall::SetSignalHandlers { enabled: false },
                NativeCall::SetInteractive { interactive: true },
                NativeCall::SetCStackLimit {
                    limit: UNLIMITED_CSTACK
                },
                NativeCall::SetupMainLoop,
            ]
        );
    }

    #[test]
    fn test_bootstrap_status_is_reported() {
        let native = Arc::new(RecordingRuntime::new().with_bootstrap_status(-1));
        let runtime = handle(&native, EmbedConfig::default());
        assert_eq!(
            runtime.initialize(false, false).unwrap(),
            InitOutcome::Started { status: -1 }
        );
        assert!(runtime.is_initialized());
    }

    #[test]
    fn test_api_mode_binds_native_callbacks() {
        let native = Arc::new(RecordingRuntime::new().with_native_callbacks());
        let config = EmbedConfig {
            interface_mode: InterfaceMode::Api,
            ..Default::default()
        };
        let runtime = handle(&native, config);

        runtime.initialize(false, true).unwrap();
        assert!(native.slot(CallbackSlot::WriteConsole).is_none());
        assert!(native.slot_written(CallbackSlot::WriteConsole));
        assert!(native.slot(CallbackSlot::ReadConsole).is_some());
        assert_eq!(
            native.count(|c| matches!(c, NativeCall::SetCallback { .. })),
            CallbackSlot::ALL.len()
        );
    }

    #[test]
    fn test_api_mode_without_native_callbacks_fails_early() {
        let native = Arc::new(RecordingRuntime::new());
        let config = EmbedConfig {
            interface_mode: InterfaceMode::Api,
            ..Default::default()
        };
        let runtime = handle(&native, config);

        let result = runtime.initialize(false, true);
        assert!(matches!(
            result,
            Err(EmbedError::CallbackUnavailable {
                provider: "native",
                slot: CallbackSlot::WriteConsoleEx
            })
        ));
        assert!(!runtime.is_initialized());
        assert!(native.calls().is_empty());

        // Without callbacks the same handle still starts.
        assert_eq!(
            runtime.initialize(false, false).unwrap(),
            InitOutcome::Started { status: 0 }
        );
    }

    #[test]
    fn test_mismatched_native_callback_fails_before_bootstrap() {
        let busy: CallbackFn = RecordingRuntime::new()
            .with_native_callbacks()
            .native_callback(CallbackImpl::Busy)
            .unwrap();
        let native = Arc::new(
            RecordingRuntime::new()
                .with_native_callbacks()
                .with_native_callback(CallbackImpl::ConsoleRead, busy),
        );
        let config = EmbedConfig {
            interface_mode: InterfaceMode::Api,
            ..Default::default()
        };
        let runtime = handle(&native, config);

        let result = runtime.initialize(false, true);
        assert!(matches!(
            result,
            Err(EmbedError::CallbackMismatch {
                slot: CallbackSlot::ReadConsole,
                actual: CallbackSlot::Busy
            })
        ));
        assert!(!runtime.is_initialized());
        assert!(native.calls().is_empty());
    }

    #[test]
    fn test_missing_r_home_changes_nothing() {
        let native = Arc::new(RecordingRuntime::new());
        let config = EmbedConfig {
            r_home: Some(std::env::temp_dir().join("rhost-no-such-r-home")),
            ..Default::default()
        };
        let runtime = RuntimeHandle::with_config(native.clone(), config).unwrap();

        let result = runtime.initialize(false, false);
        assert!(matches!(result, Err(EmbedError::RHomeNotFound(_))));
        assert!(!runtime.is_initialized());
        assert!(native.calls().is_empty());
    }

    #[test]
    fn test_second_initialize_is_noop() {
        let native = Arc::new(RecordingRuntime::new());
        let runtime = handle(&native, EmbedConfig::default());

        runtime.initialize(false, false).unwrap();
        let before = native.calls().len();
        assert_eq!(
            runtime.initialize(false, false).unwrap(),
            InitOutcome::AlreadyInitialized
        );
        assert_eq!(native.calls().len(), before);
    }
}
