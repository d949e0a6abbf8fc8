//! libR backend

use super::{EnvHandle, NativeRuntime, WellKnownEnv};
use crate::callbacks::{CallbackFn, CallbackSlot, SlotBinding};
use crate::options::CArgs;
use rhost_sys as sys;
use std::ffi::c_void;
use std::ptr::addr_of_mut;

/// LibR - the R shared library linked into this process
///
/// Every method is a thin wrapper over one native symbol. Ordering and
/// exclusion are the sequencers' job. All `LibR` values share the
/// process-wide [`Instance`](crate::runtime::Instance).
///
/// No callbacks are compiled in, so `InterfaceMode::Api` fails before
/// bootstrap with `CallbackUnavailable`; use `InterfaceMode::Abi`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibR;

impl LibR {
    pub fn new() -> Self {
        LibR
    }

    // SAFETY (all slot writers): R reads these globals only from its own
    // thread, and the sequencers write them under the embedding lock.
    unsafe fn clear_slot(slot: CallbackSlot) {
        match slot {
            CallbackSlot::WriteConsoleEx => *addr_of_mut!(sys::ptr_R_WriteConsoleEx) = None,
            CallbackSlot::WriteConsole => *addr_of_mut!(sys::ptr_R_WriteConsole) = None,
            CallbackSlot::ShowMessage => *addr_of_mut!(sys::ptr_R_ShowMessage) = None,
            CallbackSlot::ReadConsole => *addr_of_mut!(sys::ptr_R_ReadConsole) = None,
            CallbackSlot::FlushConsole => *addr_of_mut!(sys::ptr_R_FlushConsole) = None,
            CallbackSlot::ResetConsole => *addr_of_mut!(sys::ptr_R_ResetConsole) = None,
            CallbackSlot::ChooseFile => *addr_of_mut!(sys::ptr_R_ChooseFile) = None,
            CallbackSlot::ShowFiles => *addr_of_mut!(sys::ptr_R_ShowFiles) = None,
            CallbackSlot::CleanUp => *addr_of_mut!(sys::ptr_R_CleanUp) = None,
            CallbackSlot::ProcessEvents => *addr_of_mut!(sys::ptr_R_ProcessEvents) = None,
            CallbackSlot::Busy => *addr_of_mut!(sys::ptr_R_Busy) = None,
        }
    }

    unsafe fn write_slot(f: CallbackFn) {
        match f {
            CallbackFn::WriteConsoleEx(f) => *addr_of_mut!(sys::ptr_R_WriteConsoleEx) = Some(f),
            CallbackFn::WriteConsole(f) => *addr_of_mut!(sys::ptr_R_WriteConsole) = Some(f),
            CallbackFn::ShowMessage(f) => *addr_of_mut!(sys::ptr_R_ShowMessage) = Some(f),
            CallbackFn::ReadConsole(f) => *addr_of_mut!(sys::ptr_R_ReadConsole) = Some(f),
            CallbackFn::FlushConsole(f) => *addr_of_mut!(sys::ptr_R_FlushConsole) = Some(f),
            CallbackFn::ResetConsole(f) => *addr_of_mut!(sys::ptr_R_ResetConsole) = Some(f),
            CallbackFn::ChooseFile(f) => *addr_of_mut!(sys::ptr_R_ChooseFile) = Some(f),
            CallbackFn::ShowFiles(f) => *addr_of_mut!(sys::ptr_R_ShowFiles) = Some(f),
            CallbackFn::CleanUp(f) => *addr_of_mut!(sys::ptr_R_CleanUp) = Some(f),
            CallbackFn::ProcessEvents(f) => *addr_of_mut!(sys::ptr_R_ProcessEvents) = Some(f),
            CallbackFn::Busy(f) => *addr_of_mut!(sys::ptr_R_Busy) = Some(f),
        }
    }
}

impl NativeRuntime for LibR {
    fn name(&self) -> &'static str {
        "libR"
    }

    fn initialize_r(&self, args: &mut CArgs) -> i32 {
        unsafe { sys::Rf_initialize_R(args.argc(), args.argv()) }
    }

    fn unset_console_files(&self) {
        unsafe {
            *addr_of_mut!(sys::R_Outputfile) = std::ptr::null_mut();
            *addr_of_mut!(sys::R_Consolefile) = std::ptr::null_mut();
        }
    }

    fn set_signal_handlers(&self, enabled: bool) {
        unsafe { *addr_of_mut!(sys::R_SignalHandlers) = enabled as libc::c_int }
    }

    fn set_interactive(&self, interactive: bool) {
        unsafe { *addr_of_mut!(sys::R_Interactive) = interactive as sys::Rboolean }
    }

    fn set_callback(&self, slot: CallbackSlot, binding: SlotBinding) {
        unsafe {
            match binding {
                SlotBinding::RuntimeDefault => Self::clear_slot(slot),
                SlotBinding::Callback(f) => Self::write_slot(f),
            }
        }
    }

    fn set_cstack_limit(&self, limit: usize) {
        unsafe { *addr_of_mut!(sys::R_CStackLimit) = limit as libc::uintptr_t }
    }

    fn setup_main_loop(&self) {
        unsafe { sys::setup_Rmainloop() }
    }

    fn run_last_actions(&self) {
        unsafe { sys::R_dot_Last() }
    }

    fn run_exit_finalizers(&self) {
        unsafe { sys::R_RunExitFinalizers() }
    }

    fn kill_all_devices(&self) {
        unsafe { sys::Rf_KillAllDevices() }
    }

    fn clean_temp_dir(&self) {
        unsafe { sys::R_CleanTempDir() }
    }

    fn collect_garbage(&self) {
        unsafe { sys::R_gc() }
    }

    fn end_embedded(&self, fatal: i32) {
        unsafe { sys::Rf_endEmbeddedR(fatal) }
    }

    fn well_known_env(&self, which: WellKnownEnv) -> Option<EnvHandle> {
        let sexp = unsafe {
            match which {
                WellKnownEnv::Empty => sys::R_EmptyEnv,
                WellKnownEnv::Base => sys::R_BaseEnv,
                WellKnownEnv::Global => sys::R_GlobalEnv,
            }
        };
        EnvHandle::new(sexp as *mut c_void)
    }
}
