//! Recording backend
//!
//! Stands in for libR: every call is journaled, callback slots are kept in a
//! table, and nothing native runs. Used by the test suite and by dry runs.

use super::{EnvHandle, NativeRuntime, WellKnownEnv};
use crate::callbacks::{CallbackFn, CallbackImpl, CallbackSlot, SlotBinding};
use crate::options::CArgs;
use crate::runtime::Instance;
use indexmap::IndexMap;
use libc::{c_char, c_int, c_uchar};
use parking_lot::Mutex;
use serde::Serialize;
use std::ffi::c_void;
use std::sync::Arc;

/// One journaled native call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum NativeCall {
    InitializeR {
        args: Vec<String>,
        r_home: Option<String>,
    },
    UnsetConsoleFiles,
    SetSignalHandlers {
        enabled: bool,
    },
    SetInteractive {
        interactive: bool,
    },
    SetCallback {
        slot: CallbackSlot,
        runtime_default: bool,
    },
    SetCStackLimit {
        limit: usize,
    },
    SetupMainLoop,
    RunLastActions,
    RunExitFinalizers,
    KillAllDevices,
    CleanTempDir,
    CollectGarbage,
    EndEmbedded {
        fatal: i32,
    },
}

impl NativeCall {
    /// Native symbol behind the call
    pub fn symbol(&self) -> &'static str {
        match self {
            NativeCall::InitializeR { .. } => "Rf_initialize_R",
            NativeCall::UnsetConsoleFiles => "R_Outputfile/R_Consolefile",
            NativeCall::SetSignalHandlers { .. } => "R_SignalHandlers",
            NativeCall::SetInteractive { .. } => "R_Interactive",
            NativeCall::SetCallback { slot, .. } => slot.symbol(),
            NativeCall::SetCStackLimit { .. } => "R_CStackLimit",
            NativeCall::SetupMainLoop => "setup_Rmainloop",
            NativeCall::RunLastActions => "R_dot_Last",
            NativeCall::RunExitFinalizers => "R_RunExitFinalizers",
            NativeCall::KillAllDevices => "Rf_KillAllDevices",
            NativeCall::CleanTempDir => "R_CleanTempDir",
            NativeCall::CollectGarbage => "R_gc",
            NativeCall::EndEmbedded { .. } => "Rf_endEmbeddedR",
        }
    }
}

static EMPTY_ENV: u8 = 1;
static BASE_ENV: u8 = 2;
static GLOBAL_ENV: u8 = 3;

/// RecordingRuntime - journaling backend
pub struct RecordingRuntime {
    calls: Mutex<Vec<NativeCall>>,
    slots: Mutex<IndexMap<CallbackSlot, SlotBinding>>,
    bootstrap_status: i32,
    native_callbacks: bool,
    overrides: IndexMap<CallbackImpl, CallbackFn>,
    running: Mutex<bool>,
    instance: Arc<Instance>,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            slots: Mutex::new(IndexMap::new()),
            bootstrap_status: 0,
            native_callbacks: false,
            overrides: IndexMap::new(),
            running: Mutex::new(false),
            instance: Arc::new(Instance::new()),
        }
    }

    /// Status code the bootstrap entry point returns
    pub fn with_bootstrap_status(mut self, status: i32) -> Self {
        self.bootstrap_status = status;
        self
    }

    /// Expose compiled-in callbacks, as an API-mode interface library does
    pub fn with_native_callbacks(mut self) -> Self {
        self.native_callbacks = true;
        self
    }

    /// Export `f` as the compiled-in `implementation`
    pub fn with_native_callback(mut self, implementation: CallbackImpl, f: CallbackFn) -> Self {
        self.overrides.insert(implementation, f);
        self
    }

    /// Journal so far
    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls.lock().clone()
    }

    /// Number of calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&NativeCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    /// Callback currently held by `slot`; `None` for NULL or never written
    pub fn slot(&self, slot: CallbackSlot) -> Option<CallbackFn> {
        self.slots.lock().get(&slot).and_then(SlotBinding::callback)
    }

    /// Whether `slot` has been written at all
    pub fn slot_written(&self, slot: CallbackSlot) -> bool {
        self.slots.lock().contains_key(&slot)
    }

    fn record(&self, call: NativeCall) {
        log::trace!("native call: {}", call.symbol());
        self.calls.lock().push(call);
    }
}

impl Default for RecordingRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRuntime for RecordingRuntime {
    fn name(&self) -> &'static str {
        "recording"
    }

    /// Each recorder simulates its own R
    fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    fn initialize_r(&self, args: &mut CArgs) -> i32 {
        let args = args
            .strings()
            .iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.record(NativeCall::InitializeR {
            args,
            r_home: std::env::var("R_HOME").ok(),
        });
        *self.running.lock() = true;
        self.bootstrap_status
    }

    fn unset_console_files(&self) {
        self.record(NativeCall::UnsetConsoleFiles);
    }

    fn set_signal_handlers(&self, enabled: bool) {
        self.record(NativeCall::SetSignalHandlers { enabled });
    }

    fn set_interactive(&self, interactive: bool) {
        self.record(NativeCall::SetInteractive { interactive });
    }

    fn set_callback(&self, slot: CallbackSlot, binding: SlotBinding) {
        self.record(NativeCall::SetCallback {
            slot,
            runtime_default: binding.is_runtime_default(),
        });
        self.slots.lock().insert(slot, binding);
    }

    fn set_cstack_limit(&self, limit: usize) {
        self.record(NativeCall::SetCStackLimit { limit });
    }

    fn setup_main_loop(&self) {
        self.record(NativeCall::SetupMainLoop);
    }

    fn run_last_actions(&self) {
        self.record(NativeCall::RunLastActions);
    }

    fn run_exit_finalizers(&self) {
        self.record(NativeCall::RunExitFinalizers);
    }

    fn kill_all_devices(&self) {
        self.record(NativeCall::KillAllDevices);
    }

    fn clean_temp_dir(&self) {
        self.record(NativeCall::CleanTempDir);
    }

    fn collect_garbage(&self) {
        self.record(NativeCall::CollectGarbage);
    }

    fn end_embedded(&self, fatal: i32) {
        self.record(NativeCall::EndEmbedded { fatal });
        *self.running.lock() = false;
    }

    fn native_callback(&self, implementation: CallbackImpl) -> Option<CallbackFn> {
        if let Some(f) = self.overrides.get(&implementation) {
            return Some(*f);
        }
        if !self.native_callbacks {
            return None;
        }
        Some(match implementation {
            CallbackImpl::ConsoleWriteEx => CallbackFn::WriteConsoleEx(compiled::write_console_ex),
            CallbackImpl::ShowMessage => CallbackFn::ShowMessage(compiled::show_message),
            CallbackImpl::ConsoleRead => CallbackFn::ReadConsole(compiled::read_console),
            CallbackImpl::ConsoleFlush => CallbackFn::FlushConsole(compiled::noop),
            CallbackImpl::ConsoleReset => CallbackFn::ResetConsole(compiled::noop),
            CallbackImpl::ChooseFile => CallbackFn::ChooseFile(compiled::choose_file),
            CallbackImpl::ShowFiles => CallbackFn::ShowFiles(compiled::show_files),
            CallbackImpl::CleanUp => CallbackFn::CleanUp(compiled::cleanup),
            CallbackImpl::ProcessEvents => CallbackFn::ProcessEvents(compiled::noop),
            CallbackImpl::Busy => CallbackFn::Busy(compiled::busy),
        })
    }

    fn well_known_env(&self, which: WellKnownEnv) -> Option<EnvHandle> {
        if !*self.running.lock() {
            return None;
        }
        let addr = match which {
            WellKnownEnv::Empty => &EMPTY_ENV,
            WellKnownEnv::Base => &BASE_ENV,
            WellKnownEnv::Global => &GLOBAL_ENV,
        };
        EnvHandle::new(addr as *const u8 as *mut c_void)
    }
}

/// Stand-ins for callbacks an interface library would export
mod compiled {
    use super::*;

    pub unsafe extern "C" fn write_console_ex(_buf: *const c_char, _len: c_int, _otype: c_int) {}

    pub unsafe extern "C" fn show_message(_msg: *const c_char) {}

    pub unsafe extern "C" fn read_console(
        _prompt: *const c_char,
        _buf: *mut c_uchar,
        _len: c_int,
        _add_history: c_int,
    ) -> c_int {
        0
    }

    pub unsafe extern "C" fn noop() {}

    pub unsafe extern "C" fn choose_file(_new: c_int, _buf: *mut c_char, _len: c_int) -> c_int {
        0
    }

    pub unsafe extern "C" fn show_files(
        _nfile: c_int,
        _file: *const *const c_char,
        _headers: *const *const c_char,
        _wtitle: *const c_char,
        _del: c_int,
        _pager: *const c_char,
    ) -> c_int {
        0
    }

    pub unsafe extern "C" fn cleanup(_save: c_int, _status: c_int, _run_last: c_int) {}

    pub unsafe extern "C" fn busy(_which: c_int) {}
}
