//! Runtime Shutdown
//!
//! Exit hooks run in R's own quit order, then the embedded session ends.

use super::{RuntimeHandle, ShutdownOutcome};
use crate::error::Result;
use crate::logging::EmbedEvent;
use crate::native::NativeRuntime;

/// Exit hooks, in order: `.Last`, exit finalizers, graphics devices,
/// session temp dir, a final collection
pub const EXIT_HOOKS: [(&str, ExitHook); 5] = [
    ("R_dot_Last", run_last_actions),
    ("R_RunExitFinalizers", run_exit_finalizers),
    ("Rf_KillAllDevices", kill_all_devices),
    ("R_CleanTempDir", clean_temp_dir),
    ("R_gc", collect_garbage),
];

pub type ExitHook = fn(&dyn NativeRuntime);

fn run_last_actions(native: &dyn NativeRuntime) {
    native.run_last_actions();
}

fn run_exit_finalizers(native: &dyn NativeRuntime) {
    native.run_exit_finalizers();
}

fn kill_all_devices(native: &dyn NativeRuntime) {
    native.kill_all_devices();
}

fn clean_temp_dir(native: &dyn NativeRuntime) {
    native.clean_temp_dir();
}

fn collect_garbage(native: &dyn NativeRuntime) {
    native.collect_garbage();
}

impl RuntimeHandle {
    /// End the embedded R
    ///
    /// `fatal` is passed to `Rf_endEmbeddedR`; non-zero skips R's own
    /// cleanup of its temporary directory.
    ///
    /// Idempotent: calling again after R ended returns `AlreadyEnded`
    /// without native calls. R cannot be initialized again afterwards.
    pub fn shutdown(&self, fatal: i32) -> Result<ShutdownOutcome> {
        let _guard = self.lock();

        let status = self.instance.status.snapshot();
        if status.ended {
            return Ok(ShutdownOutcome::AlreadyEnded);
        }
        if !status.initialized {
            log::debug!("shutdown requested before initialization; nothing to do");
            return Ok(ShutdownOutcome::NotStarted);
        }

        if self.is_external() {
            self.instance.status.mark_ended();
            self.events.log(EmbedEvent::ShutdownCompleted { fatal });
            return Ok(ShutdownOutcome::Detached);
        }

        let native = self.native.as_ref();
        for (step, hook) in EXIT_HOOKS {
            hook(native);
            self.events.log(EmbedEvent::ShutdownStep { step });
        }

        native.end_embedded(fatal);
        self.instance.status.mark_ended();
        self.events.log(EmbedEvent::ShutdownCompleted { fatal });

        Ok(ShutdownOutcome::Ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbedConfig;
    use crate::error::EmbedError;
    use crate::native::{NativeCall, RecordingRuntime};
    use crate::status::RuntimeStatus;
    use std::sync::Arc;

    fn started() -> (Arc<RecordingRuntime>, RuntimeHandle) {
        let native = Arc::new(RecordingRuntime::new());
        let config = EmbedConfig {
            r_home: Some(std::env::temp_dir()),
            session_marker_var: "RHOST_SHUTDOWN_TEST_MARKER".to_string(),
            publish_var: "RHOST_SHUTDOWN_TEST_PUBLISHED".to_string(),
            ..Default::default()
        };
        let runtime = RuntimeHandle::with_config(native.clone(), config).unwrap();
        runtime.initialize(false, false).unwrap();
        (native, runtime)
    }

    fn exit_calls(native: &RecordingRuntime) -> Vec<NativeCall> {
        let calls = native.calls();
        let start = calls
            .iter()
            .position(|c| *c == NativeCall::RunLastActions)
            .unwrap_or(calls.len());
        calls[start..].to_vec()
    }

    #[test]
    fn test_exit_hook_order() {
        let (native, runtime) = started();
        assert_eq!(runtime.shutdown(1).unwrap(), ShutdownOutcome::Ended);

        assert_eq!(
            exit_calls(&native),
            vec![
                NativeCall::RunLastActions,
                NativeCall::RunExitFinalizers,
                NativeCall::KillAllDevices,
                NativeCall::CleanTempDir,
                NativeCall::CollectGarbage,
                NativeCall::EndEmbedded { fatal: 1 },
            ]
        );
        assert_eq!(
            runtime.status(),
            RuntimeStatus {
                initialized: true,
                busy: false,
                ended: true
            }
        );
    }

    #[test]
    fn test_shutdown_twice() {
        let (native, runtime) = started();
        runtime.shutdown(0).unwrap();
        let count = native.calls().len();

        assert_eq!(runtime.shutdown(0).unwrap(), ShutdownOutcome::AlreadyEnded);
        assert_eq!(native.calls().len(), count);
    }

    #[test]
    fn test_shutdown_before_initialize() {
        let native = Arc::new(RecordingRuntime::new());
        let runtime = RuntimeHandle::new(native.clone());

        assert_eq!(runtime.shutdown(0).unwrap(), ShutdownOutcome::NotStarted);
        assert!(native.calls().is_empty());
        assert!(!runtime.status().ended);
    }

    #[test]
    fn test_initialize_after_shutdown_rejected() {
        let (_native, runtime) = started();
        runtime.shutdown(0).unwrap();

        let result = runtime.initialize(false, false);
        assert!(matches!(result, Err(EmbedError::ReinitializationUnsupported)));
        assert!(!runtime.is_ready());
    }
}
