//! Rust trampolines for the native callback slots
//!
//! Each trampoline decodes its C arguments, forwards to the installed
//! [`Console`](crate::console::Console) and converts the result back. Panics
//! never cross the FFI boundary.

use super::{CallbackFn, CallbackImpl, CallbackSource};
use crate::console::{console, ConsoleStream, SaveAction, ShownFile};
use crate::status::StatusRegistry;
use libc::{c_char, c_int, c_uchar};
use parking_lot::RwLock;
use std::ffi::CStr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Weak};

lazy_static::lazy_static! {
    /// Status flipped by the busy callback
    static ref BUSY_STATUS: RwLock<Weak<StatusRegistry>> = RwLock::new(Weak::new());
}

/// TrampolineSource - binary-call mode implementations
pub struct TrampolineSource {
    _status: Option<Arc<StatusRegistry>>,
}

impl TrampolineSource {
    /// Trampolines reporting busy transitions to `status`
    pub fn new(status: &Arc<StatusRegistry>) -> Self {
        *BUSY_STATUS.write() = Arc::downgrade(status);
        Self {
            _status: Some(status.clone()),
        }
    }

    /// Trampolines without a status to update
    pub fn detached() -> Self {
        Self { _status: None }
    }
}

impl CallbackSource for TrampolineSource {
    fn name(&self) -> &'static str {
        "trampoline"
    }

    fn resolve(&self, implementation: CallbackImpl) -> Option<CallbackFn> {
        Some(match implementation {
            CallbackImpl::ConsoleWriteEx => CallbackFn::WriteConsoleEx(console_write_ex),
            CallbackImpl::ShowMessage => CallbackFn::ShowMessage(show_message),
            CallbackImpl::ConsoleRead => CallbackFn::ReadConsole(console_read),
            CallbackImpl::ConsoleFlush => CallbackFn::FlushConsole(console_flush),
            CallbackImpl::ConsoleReset => CallbackFn::ResetConsole(console_reset),
            CallbackImpl::ChooseFile => CallbackFn::ChooseFile(choose_file),
            CallbackImpl::ShowFiles => CallbackFn::ShowFiles(show_files),
            CallbackImpl::CleanUp => CallbackFn::CleanUp(cleanup),
            CallbackImpl::ProcessEvents => CallbackFn::ProcessEvents(process_events),
            CallbackImpl::Busy => CallbackFn::Busy(busy),
        })
    }
}

/// Run a console handler, swallowing panics
fn guarded<R>(name: &str, fallback: R, f: impl FnOnce() -> R) -> R {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => {
            log::error!("console callback {} panicked", name);
            fallback
        },
    }
}

/// NUL-terminated C string, lossily decoded; NULL is ""
unsafe fn c_str_lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Counted buffer, lossily decoded
unsafe fn c_buf_lossy(ptr: *const c_char, len: c_int) -> String {
    if ptr.is_null() || len <= 0 {
        return String::new();
    }
    let bytes = std::slice::from_raw_parts(ptr as *const u8, len as usize);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Copy `text` into a C buffer of `len` bytes, NUL-terminated, truncating
/// as needed. Returns the number of bytes copied before the terminator.
pub(crate) unsafe fn copy_to_c_buf(text: &str, buf: *mut u8, len: c_int) -> usize {
    if buf.is_null() || len <= 0 {
        return 0;
    }
    let capacity = len as usize - 1;
    let bytes = text.as_bytes();
    let n = bytes.len().min(capacity);
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf, n);
    *buf.add(n) = 0;
    n
}

pub unsafe extern "C" fn console_write_ex(buf: *const c_char, len: c_int, otype: c_int) {
    let text = c_buf_lossy(buf, len);
    guarded("WriteConsoleEx", (), || {
        console().write(&text, ConsoleStream::from_otype(otype))
    })
}

pub unsafe extern "C" fn show_message(msg: *const c_char) {
    let message = c_str_lossy(msg);
    guarded("ShowMessage", (), || console().show_message(&message))
}

/// Returns 0 on EOF, 1 when a line was stored in `buf`
pub unsafe extern "C" fn console_read(
    prompt: *const c_char,
    buf: *mut c_uchar,
    len: c_int,
    add_history: c_int,
) -> c_int {
    let prompt = c_str_lossy(prompt);
    let line = guarded("ReadConsole", None, || {
        console().read(&prompt, add_history != 0)
    });

    match line {
        Some(line) => {
            copy_to_c_buf(&line, buf, len);
            1
        },
        None => 0,
    }
}

pub unsafe extern "C" fn console_flush() {
    guarded("FlushConsole", (), || console().flush())
}

pub unsafe extern "C" fn console_reset() {
    guarded("ResetConsole", (), || console().reset())
}

/// Returns the length of the chosen name, 0 if cancelled
pub unsafe extern "C" fn choose_file(new: c_int, buf: *mut c_char, len: c_int) -> c_int {
    let name = guarded("ChooseFile", None, || console().choose_file(new != 0));

    match name {
        Some(name) => copy_to_c_buf(&name, buf as *mut u8, len) as c_int,
        None => 0,
    }
}

/// Returns 0 on success, 1 on failure
pub unsafe extern "C" fn show_files(
    nfile: c_int,
    file: *const *const c_char,
    headers: *const *const c_char,
    wtitle: *const c_char,
    del: c_int,
    pager: *const c_char,
) -> c_int {
    let mut files = Vec::new();
    if !file.is_null() {
        for i in 0..nfile.max(0) as usize {
            let header = if headers.is_null() {
                String::new()
            } else {
                c_str_lossy(*headers.add(i))
            };
            files.push(ShownFile {
                path: PathBuf::from(c_str_lossy(*file.add(i))),
                header,
            });
        }
    }
    let title = c_str_lossy(wtitle);
    let pager = c_str_lossy(pager);

    let ok = guarded("ShowFiles", false, || {
        console().show_files(&files, &title, del != 0, &pager)
    });
    if ok {
        0
    } else {
        1
    }
}

pub unsafe extern "C" fn cleanup(save: c_int, status: c_int, run_last: c_int) {
    guarded("CleanUp", (), || {
        console().cleanup(SaveAction::from_raw(save), status, run_last != 0)
    })
}

pub unsafe extern "C" fn process_events() {
    guarded("ProcessEvents", (), || console().process_events())
}

pub unsafe extern "C" fn busy(which: c_int) {
    let is_busy = which != 0;
    if let Some(status) = BUSY_STATUS.read().upgrade() {
        status.set_busy(is_busy);
    }
    guarded("Busy", (), || console().busy(is_busy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{set_console, Console};
    use parking_lot::Mutex;
    use std::ffi::CString;

    #[derive(Default)]
    struct CapturingConsole {
        written: Mutex<Vec<(String, ConsoleStream)>>,
        busy: Mutex<Vec<bool>>,
    }

    impl Console for CapturingConsole {
        fn write(&self, text: &str, stream: ConsoleStream) {
            self.written.lock().push((text.to_string(), stream));
        }

        fn read(&self, prompt: &str, _add_history: bool) -> Option<String> {
            if prompt == "eof> " {
                None
            } else {
                Some("1 + 1\n".to_string())
            }
        }

        fn show_message(&self, _message: &str) {
            panic!("handler failure");
        }

        fn busy(&self, busy: bool) {
            self.busy.lock().push(busy);
        }
    }

    #[test]
    fn test_copy_to_c_buf_truncates() {
        let mut buf = [0xffu8; 4];
        let n = unsafe { copy_to_c_buf("hello", buf.as_mut_ptr(), 4) };
        assert_eq!(n, 3);
        assert_eq!(&buf, b"hel\0");

        let n = unsafe { copy_to_c_buf("x", std::ptr::null_mut(), 4) };
        assert_eq!(n, 0);
    }

    // The console is process-wide, so all dispatch checks share one test.
    #[test]
    fn test_trampolines_dispatch_to_console() {
        let capture = Arc::new(CapturingConsole::default());
        let previous = set_console(capture.clone());

        let text = CString::new("warning!").unwrap();
        unsafe { console_write_ex(text.as_ptr(), 8, 1) };
        unsafe { console_write_ex(text.as_ptr(), 4, 0) };
        assert_eq!(
            capture.written.lock().clone(),
            vec![
                ("warning!".to_string(), ConsoleStream::Error),
                ("warn".to_string(), ConsoleStream::Output),
            ]
        );

        let prompt = CString::new("> ").unwrap();
        let mut buf = [0u8; 16];
        let rc = unsafe { console_read(prompt.as_ptr(), buf.as_mut_ptr(), 16, 1) };
        assert_eq!(rc, 1);
        assert_eq!(&buf[..7], b"1 + 1\n\0");

        let eof = CString::new("eof> ").unwrap();
        let rc = unsafe { console_read(eof.as_ptr(), buf.as_mut_ptr(), 16, 1) };
        assert_eq!(rc, 0);

        // Panicking handler is contained.
        let msg = CString::new("boom").unwrap();
        unsafe { show_message(msg.as_ptr()) };

        let status = Arc::new(StatusRegistry::new());
        status.mark_initialized();
        let _source = TrampolineSource::new(&status);
        unsafe { busy(1) };
        assert!(!status.is_ready());
        unsafe { busy(0) };
        assert!(status.is_ready());
        assert_eq!(capture.busy.lock().clone(), vec![true, false]);

        set_console(previous);
    }
}
