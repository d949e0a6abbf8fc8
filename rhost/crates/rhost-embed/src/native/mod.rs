//! Native Runtime Interface
//!
//! The entry points, globals and exit hooks of the embedded runtime, behind a
//! trait so the sequencers can drive either libR or a recording backend.
//!
//! Backends:
//! - [`LibR`]: the real thing (feature `libr`)
//! - [`RecordingRuntime`]: journals every call; used by tests and dry runs

#[cfg(feature = "libr")]
pub mod libr;
pub mod recording;

#[cfg(feature = "libr")]
pub use libr::LibR;
pub use recording::{NativeCall, RecordingRuntime};

use crate::callbacks::{CallbackFn, CallbackImpl, CallbackSlot, SlotBinding};
use crate::options::CArgs;
use crate::runtime::Instance;
use serde::Serialize;
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

/// Namespaces every R session has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WellKnownEnv {
    Empty,
    Base,
    Global,
}

impl WellKnownEnv {
    pub const ALL: [WellKnownEnv; 3] = [WellKnownEnv::Empty, WellKnownEnv::Base, WellKnownEnv::Global];
}

impl fmt::Display for WellKnownEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WellKnownEnv::Empty => "emptyenv",
            WellKnownEnv::Base => "baseenv",
            WellKnownEnv::Global => "globalenv",
        };
        f.write_str(name)
    }
}

/// Live reference to an R environment, owned by R
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvHandle(NonNull<c_void>);

// SAFETY: the handle is an address owned by R for the rest of the process;
// it is never dereferenced on the Rust side.
unsafe impl Send for EnvHandle {}
unsafe impl Sync for EnvHandle {}

impl EnvHandle {
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(EnvHandle)
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// NativeRuntime - interface of the embedded runtime
///
/// Methods are called by the sequencers only, in the documented order and
/// while the embedding lock is held.
pub trait NativeRuntime: Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Lifecycle state shared by every handle on this backend
    ///
    /// Defaults to the process-wide instance. A backend that simulates its
    /// own R returns its own.
    fn instance(&self) -> &Arc<Instance> {
        Instance::process()
    }

    /// Bootstrap entry point (`Rf_initialize_R`)
    ///
    /// May abort the process instead of returning an error.
    fn initialize_r(&self, args: &mut CArgs) -> i32;

    /// Unset `R_Outputfile` and `R_Consolefile`
    fn unset_console_files(&self);

    /// `R_SignalHandlers`
    fn set_signal_handlers(&self, enabled: bool);

    /// `R_Interactive`
    fn set_interactive(&self, interactive: bool);

    /// Write one `ptr_R_*` slot
    fn set_callback(&self, slot: CallbackSlot, binding: SlotBinding);

    /// `R_CStackLimit`
    fn set_cstack_limit(&self, limit: usize);

    /// `setup_Rmainloop`
    fn setup_main_loop(&self);

    /// `R_dot_Last`
    fn run_last_actions(&self);

    /// `R_RunExitFinalizers`
    fn run_exit_finalizers(&self);

    /// `Rf_KillAllDevices`
    fn kill_all_devices(&self);

    /// `R_CleanTempDir`
    fn clean_temp_dir(&self);

    /// `R_gc`
    fn collect_garbage(&self);

    /// `Rf_endEmbeddedR`
    fn end_embedded(&self, fatal: i32);

    /// Callback implementation compiled into the interface library
    fn native_callback(&self, _implementation: CallbackImpl) -> Option<CallbackFn> {
        None
    }

    /// Address of a well-known environment, once R is running
    fn well_known_env(&self, _which: WellKnownEnv) -> Option<EnvHandle> {
        None
    }
}
