//! Status Registry
//!
//! Lifecycle state of the embedded runtime.
//!
//! ```text
//! {} ──initialize──► {initialized} ──shutdown──► {initialized, ended}
//!                      ▲        │
//!                      └─busy───┘  {initialized, busy}
//! ```
//!
//! There is no transition back to `{}`: R cannot be bootstrapped twice in
//! one process.

use crate::error::{EmbedError, Result};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;

/// Legacy bit for `initialized`
pub const STATUS_INITIALIZED: u8 = 0x01;
/// Legacy bit for `busy`
pub const STATUS_BUSY: u8 = 0x02;
/// Legacy bit for `ended`
pub const STATUS_ENDED: u8 = 0x04;

/// Runtime lifecycle flags
///
/// Legal combinations are `{}`, `{initialized}`, `{initialized, busy}` and
/// `{initialized, ended}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStatus {
    pub initialized: bool,
    pub busy: bool,
    pub ended: bool,
}

impl RuntimeStatus {
    /// Nothing happened yet
    pub const UNINITIALIZED: RuntimeStatus = RuntimeStatus {
        initialized: false,
        busy: false,
        ended: false,
    };

    /// Usable: initialized, neither busy nor ended
    pub fn is_ready(&self) -> bool {
        self.initialized && !self.busy && !self.ended
    }

    /// Bitmask encoding, for diagnostics and interop
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.initialized {
            bits |= STATUS_INITIALIZED;
        }
        if self.busy {
            bits |= STATUS_BUSY;
        }
        if self.ended {
            bits |= STATUS_ENDED;
        }
        bits
    }
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match (self.initialized, self.busy, self.ended) {
            (false, _, _) => "uninitialized",
            (true, _, true) => "ended",
            (true, true, false) => "busy",
            (true, false, false) => "ready",
        };
        f.write_str(label)
    }
}

/// StatusRegistry - shared view of the runtime status
///
/// Reads never fail and never block on native calls. Writes are made by the
/// sequencers while they hold the embedding lock.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    status: RwLock<RuntimeStatus>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status flags
    pub fn snapshot(&self) -> RuntimeStatus {
        *self.status.read()
    }

    /// Has the bootstrap entry point been invoked
    pub fn is_initialized(&self) -> bool {
        self.status.read().initialized
    }

    /// Has the runtime been shut down
    pub fn is_ended(&self) -> bool {
        self.status.read().ended
    }

    /// Is the embedded runtime ready for use
    pub fn is_ready(&self) -> bool {
        self.status.read().is_ready()
    }

    /// Fail with `NotReady` unless ready
    pub fn assert_ready(&self) -> Result<()> {
        if !self.is_ready() {
            return Err(EmbedError::NotReady);
        }
        Ok(())
    }

    pub(crate) fn mark_initialized(&self) {
        self.status.write().initialized = true;
    }

    pub(crate) fn mark_ended(&self) {
        let mut status = self.status.write();
        debug_assert!(status.initialized, "ended without being initialized");
        status.ended = true;
        status.busy = false;
    }

    /// Toggle the busy flag; ignored outside `{initialized}`/`{initialized, busy}`
    pub fn set_busy(&self, busy: bool) {
        let mut status = self.status.write();
        if status.initialized && !status.ended {
            status.busy = busy;
        }
    }
}
