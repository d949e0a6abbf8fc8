//! Declarative mode: implementations exported by the native interface library

use super::{CallbackFn, CallbackImpl, CallbackSource};
use crate::native::NativeRuntime;

/// NativeSource - callbacks compiled into the backend
pub struct NativeSource<'a> {
    native: &'a dyn NativeRuntime,
}

impl<'a> NativeSource<'a> {
    pub fn new(native: &'a dyn NativeRuntime) -> Self {
        Self { native }
    }
}

impl CallbackSource for NativeSource<'_> {
    fn name(&self) -> &'static str {
        "native"
    }

    fn resolve(&self, implementation: CallbackImpl) -> Option<CallbackFn> {
        self.native.native_callback(implementation)
    }
}
