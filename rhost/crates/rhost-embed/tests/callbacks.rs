//! Callback Installation Tests
//!
//! What ends up in the `ptr_R_*` slots for each interface mode.

mod common;

use common::EmbedFixture;
use rhost_embed::callbacks::{bind, CallbackImpl, CallbackSource};
use rhost_embed::{
    CallbackSlot, EmbedError, EmbedEvent, InterfaceMode, NativeCall, RecordingRuntime,
    SlotBinding, TrampolineSource,
};

#[test]
fn test_abi_mode_installs_trampolines() {
    let fixture = EmbedFixture::with_defaults();
    fixture.runtime.initialize(false, true).unwrap();

    for slot in CallbackSlot::ALL {
        assert!(fixture.native.slot_written(slot), "{} not written", slot);
        let bound = fixture.native.slot(slot);
        if slot == CallbackSlot::WriteConsole {
            assert!(bound.is_none(), "{} should be left to R", slot);
        } else {
            assert_eq!(bound.map(|f| f.slot()), Some(slot));
        }
    }
}

#[test]
fn test_default_slot_is_null() {
    let fixture = EmbedFixture::with_defaults();
    let native = fixture.native.as_ref();
    let f = TrampolineSource::detached()
        .resolve(CallbackImpl::ConsoleFlush)
        .unwrap();

    bind(native, CallbackSlot::FlushConsole, SlotBinding::Callback(f)).unwrap();
    bind(native, CallbackSlot::FlushConsole, SlotBinding::RuntimeDefault).unwrap();

    assert!(native.slot(CallbackSlot::FlushConsole).is_none());
    assert_eq!(
        native.calls().last(),
        Some(&NativeCall::SetCallback {
            slot: CallbackSlot::FlushConsole,
            runtime_default: true
        })
    );
}

#[test]
fn test_mismatched_binding_writes_nothing() {
    let fixture = EmbedFixture::with_defaults();
    let f = TrampolineSource::detached()
        .resolve(CallbackImpl::ConsoleRead)
        .unwrap();

    let result = bind(
        fixture.native.as_ref(),
        CallbackSlot::WriteConsole,
        SlotBinding::Callback(f),
    );
    assert!(matches!(result, Err(EmbedError::CallbackMismatch { .. })));
    assert!(!fixture.native.slot_written(CallbackSlot::WriteConsole));
}

#[test]
fn test_api_mode_uses_backend_callbacks() {
    let fixture = EmbedFixture::build(RecordingRuntime::new().with_native_callbacks(), |config| {
        config.interface_mode = InterfaceMode::Api;
    });
    fixture.runtime.initialize(false, true).unwrap();

    let trampoline = TrampolineSource::detached()
        .resolve(CallbackImpl::ConsoleRead)
        .unwrap();
    let installed = fixture.native.slot(CallbackSlot::ReadConsole).unwrap();
    assert_ne!(installed.addr(), trampoline.addr());
    assert!(fixture.native.slot(CallbackSlot::WriteConsole).is_none());
}

#[test]
fn test_api_mode_without_backend_callbacks_is_rejected() {
    let fixture = EmbedFixture::with_config(|config| {
        config.interface_mode = InterfaceMode::Api;
    });

    let result = fixture.runtime.initialize(false, true);
    assert!(matches!(
        result,
        Err(EmbedError::CallbackUnavailable {
            provider: "native",
            ..
        })
    ));
    assert!(fixture.native.calls().is_empty());
    assert!(!fixture.runtime.is_initialized());
    for slot in CallbackSlot::ALL {
        assert!(!fixture.native.slot_written(slot));
    }
}

#[test]
fn test_api_mode_mismatched_backend_callback_is_rejected() {
    let show_message = TrampolineSource::detached()
        .resolve(CallbackImpl::ShowMessage)
        .unwrap();
    let native = RecordingRuntime::new()
        .with_native_callbacks()
        .with_native_callback(CallbackImpl::Busy, show_message);
    let fixture = EmbedFixture::build(native, |config| {
        config.interface_mode = InterfaceMode::Api;
    });

    let result = fixture.runtime.initialize(false, true);
    assert!(matches!(
        result,
        Err(EmbedError::CallbackMismatch {
            slot: CallbackSlot::Busy,
            actual: CallbackSlot::ShowMessage
        })
    ));
    assert_eq!(fixture.bootstrap_count(), 0);
    assert!(!fixture.runtime.is_initialized());
}

#[test]
fn test_opt_out_touches_no_slot() {
    let fixture = EmbedFixture::with_defaults();
    fixture.runtime.initialize(false, false).unwrap();

    for slot in CallbackSlot::ALL {
        assert!(!fixture.native.slot_written(slot));
    }
}

#[test]
fn test_binding_events_journaled() {
    let fixture = EmbedFixture::with_defaults();
    fixture.runtime.initialize(false, true).unwrap();

    let bound: Vec<_> = fixture
        .runtime
        .events()
        .events()
        .into_iter()
        .filter_map(|e| match e {
            EmbedEvent::CallbackBound {
                slot,
                runtime_default,
            } => Some((slot, runtime_default)),
            _ => None,
        })
        .collect();

    assert_eq!(bound.len(), CallbackSlot::ALL.len());
    assert_eq!(bound[1], (CallbackSlot::WriteConsole, true));
    assert!(bound
        .iter()
        .filter(|(slot, _)| *slot != CallbackSlot::WriteConsole)
        .all(|(_, runtime_default)| !runtime_default));
}
