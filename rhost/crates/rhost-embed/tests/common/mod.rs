//! Test Utilities for the embedding lifecycle suite
//!
//! Every fixture drives a [`RecordingRuntime`], so the native call journal
//! can be asserted exactly.
//!
//! The process environment (`R_HOME`, session markers) and the callback
//! globals are process-wide. Fixtures hold [`SERIAL`] for their whole life
//! so tests in one binary never interleave.

#![allow(dead_code)]

use parking_lot::{const_mutex, Mutex, MutexGuard};
use rhost_embed::{EmbedConfig, InitOutcome, NativeCall, RecordingRuntime, RuntimeHandle};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Marker variable read by fixtures, never set outside tests
pub const TEST_MARKER_VAR: &str = "RHOST_TEST_SESSION_MARKER";

/// Variable fixtures publish under
pub const TEST_PUBLISH_VAR: &str = "RHOST_TEST_SESSION_PUBLISHED";

/// Serializes fixtures within one test binary
pub static SERIAL: Mutex<()> = const_mutex(());

/// ============================================================================
/// EMBED FIXTURE
/// ============================================================================

/// Test fixture for lifecycle operations
///
/// Provides a fresh handle on a recording backend with its own R home.
pub struct EmbedFixture {
    pub native: Arc<RecordingRuntime>,
    pub runtime: RuntimeHandle,
    pub r_home: TempDir,
    _serial: MutexGuard<'static, ()>,
}

impl EmbedFixture {
    /// Fixture with default configuration
    pub fn with_defaults() -> Self {
        Self::build(RecordingRuntime::new(), |_| {})
    }

    /// Fixture with configuration adjusted by `adjust`
    pub fn with_config(adjust: impl FnOnce(&mut EmbedConfig)) -> Self {
        Self::build(RecordingRuntime::new(), adjust)
    }

    /// Fixture on a customized backend
    pub fn with_native(native: RecordingRuntime) -> Self {
        Self::build(native, |_| {})
    }

    /// Fixture on a customized backend and configuration
    pub fn build(native: RecordingRuntime, adjust: impl FnOnce(&mut EmbedConfig)) -> Self {
        let serial = SERIAL.lock();
        std::env::remove_var(TEST_MARKER_VAR);
        std::env::remove_var(TEST_PUBLISH_VAR);

        let r_home = tempfile::tempdir().expect("temporary R home should be created");
        let mut config = EmbedConfig {
            r_home: Some(r_home.path().to_path_buf()),
            session_marker_var: TEST_MARKER_VAR.to_string(),
            publish_var: TEST_PUBLISH_VAR.to_string(),
            ..Default::default()
        };
        adjust(&mut config);

        let native = Arc::new(native);
        let runtime = RuntimeHandle::with_config(native.clone(), config)
            .expect("fixture configuration should validate");

        Self {
            native,
            runtime,
            r_home,
            _serial: serial,
        }
    }

    /// Initialize without callbacks, asserting a fresh bootstrap
    pub fn start(&self) {
        let outcome = self
            .runtime
            .initialize(false, false)
            .expect("initialization should succeed");
        assert_eq!(outcome, InitOutcome::Started { status: 0 });
    }

    pub fn r_home(&self) -> &Path {
        self.r_home.path()
    }

    /// Number of bootstrap calls so far
    pub fn bootstrap_count(&self) -> usize {
        self.native
            .count(|c| matches!(c, NativeCall::InitializeR { .. }))
    }

    /// Number of `Rf_endEmbeddedR` calls so far
    pub fn end_count(&self) -> usize {
        self.native
            .count(|c| matches!(c, NativeCall::EndEmbedded { .. }))
    }

    /// Native symbols called so far, in order
    pub fn symbols(&self) -> Vec<&'static str> {
        self.native.calls().iter().map(NativeCall::symbol).collect()
    }
}

impl Drop for EmbedFixture {
    fn drop(&mut self) {
        std::env::remove_var(TEST_MARKER_VAR);
        std::env::remove_var(TEST_PUBLISH_VAR);
    }
}
