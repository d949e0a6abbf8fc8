//! Callback Table Binder
//!
//! R exposes its console and lifecycle hooks as a set of function-pointer
//! globals (`ptr_R_*`). At bootstrap we walk a fixed table and write each slot
//! either with an implementation or with NULL, which lets R keep its own
//! built-in behavior for that slot.
//!
//! Where implementations come from is a [`CallbackSource`]:
//! - [`TrampolineSource`]: Rust `extern "C"` trampolines dispatching to the
//!   installed [`Console`](crate::console::Console)
//! - [`NativeSource`]: implementations compiled into the native interface
//!   library itself

pub mod native;
pub mod trampoline;

pub use native::NativeSource;
pub use trampoline::TrampolineSource;

use crate::error::{EmbedError, Result};
use crate::native::NativeRuntime;
use rhost_sys::{
    BusyFn, ChooseFileFn, CleanUpFn, FlushConsoleFn, ProcessEventsFn, ReadConsoleFn,
    ResetConsoleFn, ShowFilesFn, ShowMessageFn, WriteConsoleExFn, WriteConsoleFn,
};
use serde::Serialize;
use std::fmt;

/// Native callback slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CallbackSlot {
    #[serde(rename = "ptr_R_WriteConsoleEx")]
    WriteConsoleEx,
    #[serde(rename = "ptr_R_WriteConsole")]
    WriteConsole,
    #[serde(rename = "ptr_R_ShowMessage")]
    ShowMessage,
    #[serde(rename = "ptr_R_ReadConsole")]
    ReadConsole,
    #[serde(rename = "ptr_R_FlushConsole")]
    FlushConsole,
    #[serde(rename = "ptr_R_ResetConsole")]
    ResetConsole,
    #[serde(rename = "ptr_R_ChooseFile")]
    ChooseFile,
    #[serde(rename = "ptr_R_ShowFiles")]
    ShowFiles,
    #[serde(rename = "ptr_R_CleanUp")]
    CleanUp,
    #[serde(rename = "ptr_R_ProcessEvents")]
    ProcessEvents,
    #[serde(rename = "ptr_R_Busy")]
    Busy,
}

impl CallbackSlot {
    /// All slots, in installation order
    pub const ALL: [CallbackSlot; 11] = [
        CallbackSlot::WriteConsoleEx,
        CallbackSlot::WriteConsole,
        CallbackSlot::ShowMessage,
        CallbackSlot::ReadConsole,
        CallbackSlot::FlushConsole,
        CallbackSlot::ResetConsole,
        CallbackSlot::ChooseFile,
        CallbackSlot::ShowFiles,
        CallbackSlot::CleanUp,
        CallbackSlot::ProcessEvents,
        CallbackSlot::Busy,
    ];

    /// Name of the native global
    pub fn symbol(&self) -> &'static str {
        match self {
            CallbackSlot::WriteConsoleEx => "ptr_R_WriteConsoleEx",
            CallbackSlot::WriteConsole => "ptr_R_WriteConsole",
            CallbackSlot::ShowMessage => "ptr_R_ShowMessage",
            CallbackSlot::ReadConsole => "ptr_R_ReadConsole",
            CallbackSlot::FlushConsole => "ptr_R_FlushConsole",
            CallbackSlot::ResetConsole => "ptr_R_ResetConsole",
            CallbackSlot::ChooseFile => "ptr_R_ChooseFile",
            CallbackSlot::ShowFiles => "ptr_R_ShowFiles",
            CallbackSlot::CleanUp => "ptr_R_CleanUp",
            CallbackSlot::ProcessEvents => "ptr_R_ProcessEvents",
            CallbackSlot::Busy => "ptr_R_Busy",
        }
    }
}

impl fmt::Display for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Typed native callback
///
/// The variant fixes which slot the pointer may be written to.
#[derive(Debug, Clone, Copy)]
pub enum CallbackFn {
    WriteConsoleEx(WriteConsoleExFn),
    WriteConsole(WriteConsoleFn),
    ShowMessage(ShowMessageFn),
    ReadConsole(ReadConsoleFn),
    FlushConsole(FlushConsoleFn),
    ResetConsole(ResetConsoleFn),
    ChooseFile(ChooseFileFn),
    ShowFiles(ShowFilesFn),
    CleanUp(CleanUpFn),
    ProcessEvents(ProcessEventsFn),
    Busy(BusyFn),
}

impl CallbackFn {
    /// Slot this signature belongs to
    pub fn slot(&self) -> CallbackSlot {
        match self {
            CallbackFn::WriteConsoleEx(_) => CallbackSlot::WriteConsoleEx,
            CallbackFn::WriteConsole(_) => CallbackSlot::WriteConsole,
            CallbackFn::ShowMessage(_) => CallbackSlot::ShowMessage,
            CallbackFn::ReadConsole(_) => CallbackSlot::ReadConsole,
            CallbackFn::FlushConsole(_) => CallbackSlot::FlushConsole,
            CallbackFn::ResetConsole(_) => CallbackSlot::ResetConsole,
            CallbackFn::ChooseFile(_) => CallbackSlot::ChooseFile,
            CallbackFn::ShowFiles(_) => CallbackSlot::ShowFiles,
            CallbackFn::CleanUp(_) => CallbackSlot::CleanUp,
            CallbackFn::ProcessEvents(_) => CallbackSlot::ProcessEvents,
            CallbackFn::Busy(_) => CallbackSlot::Busy,
        }
    }

    /// Code address, for diagnostics
    pub fn addr(&self) -> usize {
        match *self {
            CallbackFn::WriteConsoleEx(f) => f as usize,
            CallbackFn::WriteConsole(f) => f as usize,
            CallbackFn::ShowMessage(f) => f as usize,
            CallbackFn::ReadConsole(f) => f as usize,
            CallbackFn::FlushConsole(f) => f as usize,
            CallbackFn::ResetConsole(f) => f as usize,
            CallbackFn::ChooseFile(f) => f as usize,
            CallbackFn::ShowFiles(f) => f as usize,
            CallbackFn::CleanUp(f) => f as usize,
            CallbackFn::ProcessEvents(f) => f as usize,
            CallbackFn::Busy(f) => f as usize,
        }
    }
}

/// What a slot ends up holding
#[derive(Debug, Clone, Copy)]
pub enum SlotBinding {
    /// NULL: R keeps its built-in behavior
    RuntimeDefault,
    /// An implementation
    Callback(CallbackFn),
}

impl SlotBinding {
    pub fn is_runtime_default(&self) -> bool {
        matches!(self, SlotBinding::RuntimeDefault)
    }

    pub fn callback(&self) -> Option<CallbackFn> {
        match self {
            SlotBinding::RuntimeDefault => None,
            SlotBinding::Callback(f) => Some(*f),
        }
    }
}

/// Named implementations a [`CallbackSource`] can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackImpl {
    ConsoleWriteEx,
    ShowMessage,
    ConsoleRead,
    ConsoleFlush,
    ConsoleReset,
    ChooseFile,
    ShowFiles,
    CleanUp,
    ProcessEvents,
    Busy,
}

/// Installation policy: slot and the implementation it receives
///
/// `None` leaves the slot to R. Plain `ptr_R_WriteConsole` stays NULL so
/// that R routes all output through `ptr_R_WriteConsoleEx`.
pub const CALLBACK_TABLE: [(CallbackSlot, Option<CallbackImpl>); 11] = [
    (CallbackSlot::WriteConsoleEx, Some(CallbackImpl::ConsoleWriteEx)),
    (CallbackSlot::WriteConsole, None),
    (CallbackSlot::ShowMessage, Some(CallbackImpl::ShowMessage)),
    (CallbackSlot::ReadConsole, Some(CallbackImpl::ConsoleRead)),
    (CallbackSlot::FlushConsole, Some(CallbackImpl::ConsoleFlush)),
    (CallbackSlot::ResetConsole, Some(CallbackImpl::ConsoleReset)),
    (CallbackSlot::ChooseFile, Some(CallbackImpl::ChooseFile)),
    (CallbackSlot::ShowFiles, Some(CallbackImpl::ShowFiles)),
    (CallbackSlot::CleanUp, Some(CallbackImpl::CleanUp)),
    (CallbackSlot::ProcessEvents, Some(CallbackImpl::ProcessEvents)),
    (CallbackSlot::Busy, Some(CallbackImpl::Busy)),
];

/// CallbackSource - where callback implementations come from
pub trait CallbackSource {
    /// Source name for diagnostics
    fn name(&self) -> &'static str;

    /// Implementation for `implementation`, if this source has one
    fn resolve(&self, implementation: CallbackImpl) -> Option<CallbackFn>;
}

/// Check that `binding` may be written to `slot`
fn check(slot: CallbackSlot, binding: &SlotBinding) -> Result<()> {
    match binding {
        SlotBinding::Callback(f) if f.slot() != slot => Err(EmbedError::CallbackMismatch {
            slot,
            actual: f.slot(),
        }),
        _ => Ok(()),
    }
}

/// Write one slot
///
/// # Errors
/// `CallbackMismatch` if the callback's signature belongs to another slot.
pub fn bind(native: &dyn NativeRuntime, slot: CallbackSlot, binding: SlotBinding) -> Result<()> {
    check(slot, &binding)?;
    native.set_callback(slot, binding);
    Ok(())
}

/// ResolvedTable - [`CALLBACK_TABLE`] resolved against a source
///
/// Every binding has been checked against its slot, so installing it
/// cannot fail halfway through.
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    bindings: Vec<(CallbackSlot, SlotBinding)>,
}

impl ResolvedTable {
    /// Resolve every entry of [`CALLBACK_TABLE`] with `source`
    ///
    /// # Errors
    /// - `CallbackUnavailable` if `source` lacks an implementation the table
    ///   asks for
    /// - `CallbackMismatch` if `source` returns a callback of another slot
    pub fn resolve(source: &dyn CallbackSource) -> Result<Self> {
        let mut bindings = Vec::with_capacity(CALLBACK_TABLE.len());

        for (slot, implementation) in CALLBACK_TABLE {
            let binding = match implementation {
                None => SlotBinding::RuntimeDefault,
                Some(implementation) => match source.resolve(implementation) {
                    Some(f) => SlotBinding::Callback(f),
                    None => {
                        return Err(EmbedError::CallbackUnavailable {
                            provider: source.name(),
                            slot,
                        })
                    },
                },
            };
            check(slot, &binding)?;
            bindings.push((slot, binding));
        }

        Ok(Self { bindings })
    }

    /// Bindings in installation order
    pub fn bindings(&self) -> &[(CallbackSlot, SlotBinding)] {
        &self.bindings
    }

    /// Write every slot
    pub fn install(&self, native: &dyn NativeRuntime) {
        for (slot, binding) in &self.bindings {
            native.set_callback(*slot, *binding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::RecordingRuntime;

    struct EmptySource;

    impl CallbackSource for EmptySource {
        fn name(&self) -> &'static str {
            "empty"
        }

        fn resolve(&self, _implementation: CallbackImpl) -> Option<CallbackFn> {
            None
        }
    }

    #[test]
    fn test_table_covers_every_slot_once() {
        let slots: Vec<_> = CALLBACK_TABLE.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots, CallbackSlot::ALL.to_vec());
    }

    #[test]
    fn test_bind_runtime_default_is_null() {
        let native = RecordingRuntime::new();
        let source = TrampolineSource::detached();
        let f = source.resolve(CallbackImpl::Busy).unwrap();

        bind(&native, CallbackSlot::Busy, SlotBinding::Callback(f)).unwrap();
        assert!(native.slot(CallbackSlot::Busy).is_some());

        bind(&native, CallbackSlot::Busy, SlotBinding::RuntimeDefault).unwrap();
        assert!(native.slot(CallbackSlot::Busy).is_none());
    }

    #[test]
    fn test_bind_rejects_mismatched_signature() {
        let native = RecordingRuntime::new();
        let f = TrampolineSource::detached()
            .resolve(CallbackImpl::ShowMessage)
            .unwrap();

        let result = bind(&native, CallbackSlot::Busy, SlotBinding::Callback(f));
        assert!(matches!(
            result,
            Err(EmbedError::CallbackMismatch {
                slot: CallbackSlot::Busy,
                actual: CallbackSlot::ShowMessage
            })
        ));
        assert!(native.calls().is_empty());
    }

    struct SwappedSource;

    impl CallbackSource for SwappedSource {
        fn name(&self) -> &'static str {
            "swapped"
        }

        fn resolve(&self, _implementation: CallbackImpl) -> Option<CallbackFn> {
            TrampolineSource::detached().resolve(CallbackImpl::ShowMessage)
        }
    }

    #[test]
    fn test_install_resolved_trampolines() {
        let native = RecordingRuntime::new();
        let table = ResolvedTable::resolve(&TrampolineSource::detached()).unwrap();
        assert!(native.calls().is_empty());

        table.install(&native);
        assert_eq!(table.bindings().len(), 11);
        for (slot, binding) in table.bindings() {
            if *slot == CallbackSlot::WriteConsole {
                assert!(binding.is_runtime_default());
                assert!(native.slot(*slot).is_none());
            } else {
                let f = binding.callback().expect("slot should be bound");
                assert_eq!(f.slot(), *slot);
                assert_eq!(native.slot(*slot).map(|f| f.addr()), Some(f.addr()));
            }
        }
    }

    #[test]
    fn test_resolve_fails_on_missing_implementation() {
        let result = ResolvedTable::resolve(&EmptySource);
        assert!(matches!(
            result,
            Err(EmbedError::CallbackUnavailable {
                provider: "empty",
                slot: CallbackSlot::WriteConsoleEx
            })
        ));
    }

    #[test]
    fn test_resolve_fails_on_mismatched_callback() {
        let result = ResolvedTable::resolve(&SwappedSource);
        assert!(matches!(
            result,
            Err(EmbedError::CallbackMismatch {
                slot: CallbackSlot::WriteConsoleEx,
                actual: CallbackSlot::ShowMessage
            })
        ));
    }
}
