//! Raw libR embedding bindings
//!
//! Declarations for the subset of `Rembedded.h`, `Rinterface.h` and
//! `Rinternals.h` needed to bootstrap, wire and tear down an embedded R.
//!
//! The callback signatures are always available so that callers can build
//! trampolines without linking R. The `extern` block itself is only compiled
//! with the `link` feature.

#![allow(non_camel_case_types, non_upper_case_globals, non_snake_case)]

use libc::{c_char, c_int, c_uchar};

/// Opaque R object
#[repr(C)]
pub struct SEXPREC {
    _private: [u8; 0],
}

/// Pointer to an R object
pub type SEXP = *mut SEXPREC;

/// `Rboolean` is a C enum, passed as `int`
pub type Rboolean = c_int;

/// `SA_TYPE` (save action) is a C enum, passed as `int`
pub type SA_TYPE = c_int;

pub type WriteConsoleExFn = unsafe extern "C" fn(buf: *const c_char, len: c_int, otype: c_int);
pub type WriteConsoleFn = unsafe extern "C" fn(buf: *const c_char, len: c_int);
pub type ShowMessageFn = unsafe extern "C" fn(msg: *const c_char);
pub type ReadConsoleFn = unsafe extern "C" fn(
    prompt: *const c_char,
    buf: *mut c_uchar,
    len: c_int,
    add_history: c_int,
) -> c_int;
pub type FlushConsoleFn = unsafe extern "C" fn();
pub type ResetConsoleFn = unsafe extern "C" fn();
pub type ChooseFileFn = unsafe extern "C" fn(new: c_int, buf: *mut c_char, len: c_int) -> c_int;
pub type ShowFilesFn = unsafe extern "C" fn(
    nfile: c_int,
    file: *const *const c_char,
    headers: *const *const c_char,
    wtitle: *const c_char,
    del: Rboolean,
    pager: *const c_char,
) -> c_int;
pub type CleanUpFn = unsafe extern "C" fn(save: SA_TYPE, status: c_int, run_last: c_int);
pub type ProcessEventsFn = unsafe extern "C" fn();
pub type BusyFn = unsafe extern "C" fn(which: c_int);

#[cfg(feature = "link")]
#[link(name = "R")]
extern "C" {
    // Rembedded.h
    pub fn Rf_initialize_R(ac: c_int, av: *mut *mut c_char) -> c_int;
    pub fn setup_Rmainloop();
    pub fn Rf_endEmbeddedR(fatal: c_int);

    // Exit hooks
    pub fn R_dot_Last();
    pub fn R_RunExitFinalizers();
    pub fn Rf_KillAllDevices();
    pub fn R_CleanTempDir();
    pub fn R_gc();

    // Rinterface.h globals
    pub static mut R_Outputfile: *mut libc::FILE;
    pub static mut R_Consolefile: *mut libc::FILE;
    pub static mut R_SignalHandlers: c_int;
    pub static mut R_Interactive: Rboolean;
    pub static mut R_CStackLimit: libc::uintptr_t;

    // Rinterface.h callback slots
    pub static mut ptr_R_WriteConsoleEx: Option<WriteConsoleExFn>;
    pub static mut ptr_R_WriteConsole: Option<WriteConsoleFn>;
    pub static mut ptr_R_ShowMessage: Option<ShowMessageFn>;
    pub static mut ptr_R_ReadConsole: Option<ReadConsoleFn>;
    pub static mut ptr_R_FlushConsole: Option<FlushConsoleFn>;
    pub static mut ptr_R_ResetConsole: Option<ResetConsoleFn>;
    pub static mut ptr_R_ChooseFile: Option<ChooseFileFn>;
    pub static mut ptr_R_ShowFiles: Option<ShowFilesFn>;
    pub static mut ptr_R_CleanUp: Option<CleanUpFn>;
    pub static mut ptr_R_ProcessEvents: Option<ProcessEventsFn>;
    pub static mut ptr_R_Busy: Option<BusyFn>;

    // Rinternals.h environments
    pub static R_EmptyEnv: SEXP;
    pub static R_BaseEnv: SEXP;
    pub static R_GlobalEnv: SEXP;
}
