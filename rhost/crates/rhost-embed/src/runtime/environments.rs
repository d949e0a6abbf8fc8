//! Well-known environments
//!
//! Handles to `emptyenv()`, `baseenv()` and `globalenv()`. Each is written
//! once, after R is ready, and stays valid for the rest of the process.

use super::RuntimeHandle;
use crate::error::Result;
use crate::native::{EnvHandle, WellKnownEnv};
use std::sync::OnceLock;

/// WellKnownEnvironments - write-once environment handles
#[derive(Debug, Default)]
pub struct WellKnownEnvironments {
    empty: OnceLock<EnvHandle>,
    base: OnceLock<EnvHandle>,
    global: OnceLock<EnvHandle>,
}

impl WellKnownEnvironments {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, which: WellKnownEnv) -> &OnceLock<EnvHandle> {
        match which {
            WellKnownEnv::Empty => &self.empty,
            WellKnownEnv::Base => &self.base,
            WellKnownEnv::Global => &self.global,
        }
    }

    /// Handle for `which`; `None` until bound
    pub fn get(&self, which: WellKnownEnv) -> Option<EnvHandle> {
        self.slot(which).get().copied()
    }

    pub fn empty(&self) -> Option<EnvHandle> {
        self.get(WellKnownEnv::Empty)
    }

    pub fn base(&self) -> Option<EnvHandle> {
        self.get(WellKnownEnv::Base)
    }

    pub fn global(&self) -> Option<EnvHandle> {
        self.get(WellKnownEnv::Global)
    }

    /// Are all three bound
    pub fn is_bound(&self) -> bool {
        WellKnownEnv::ALL.iter().all(|which| self.get(*which).is_some())
    }

    /// Store `handle` unless already set; returns the handle in place
    fn populate(&self, which: WellKnownEnv, handle: EnvHandle) -> EnvHandle {
        *self.slot(which).get_or_init(|| handle)
    }
}

impl RuntimeHandle {
    /// Populate the well-known environments from the running R
    ///
    /// Already bound handles are kept. Returns how many are bound.
    ///
    /// # Errors
    /// `NotReady` unless R is ready.
    pub fn bind_environments(&self) -> Result<usize> {
        let _guard = self.lock();
        self.instance.status.assert_ready()?;

        for which in WellKnownEnv::ALL {
            if self.environments.get(which).is_some() {
                continue;
            }
            match self.native.well_known_env(which) {
                Some(handle) => {
                    self.environments.populate(which, handle);
                },
                None => log::warn!("{} backend has no {}", self.native.name(), which),
            }
        }

        Ok(WellKnownEnv::ALL
            .iter()
            .filter(|which| self.environments.get(**which).is_some())
            .count())
    }
}
