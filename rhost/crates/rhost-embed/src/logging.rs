//! Embedding Event Log
//!
//! Journal of lifecycle events, useful for:
//! - Diagnosing a failed bootstrap
//! - Verifying the order of native calls
//! - Production monitoring
//!
//! Events are forwarded to the `log` facade and kept in memory.
//!
//! Log Levels:
//! - WARN: Rejected or unusual transitions
//! - INFO: Bootstrap and shutdown milestones
//! - DEBUG: Individual steps
//! - TRACE: Per-slot callback binding

use crate::callbacks::CallbackSlot;
use log::Level;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Embedding event types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbedEvent {
    /// Startup options replaced
    OptionsChanged { options: Vec<String> },

    /// Initialization found R already running in this process
    ExternalSession { marker_var: String },

    /// Bootstrap entry point about to run
    BootstrapStarted { argc: usize, r_home: String },

    /// Bootstrap entry point returned
    BootstrapCompleted { status: i32 },

    /// One callback slot written
    CallbackBound {
        slot: CallbackSlot,
        runtime_default: bool,
    },

    /// Caller opted out of callback installation
    CallbacksSkipped,

    /// Main loop set up, runtime ready
    MainLoopReady,

    /// Process marker published
    ProcessInfoPublished { var: String, marker: String },

    /// One exit hook ran
    ShutdownStep { step: &'static str },

    /// Runtime ended
    ShutdownCompleted { fatal: i32 },

    /// Initialization attempted after shutdown
    ReinitializationRejected,
}

impl EmbedEvent {
    /// Log level for event
    pub fn level(&self) -> Level {
        match self {
            EmbedEvent::ReinitializationRejected => Level::Warn,
            EmbedEvent::ExternalSession { .. }
            | EmbedEvent::BootstrapStarted { .. }
            | EmbedEvent::BootstrapCompleted { .. }
            | EmbedEvent::MainLoopReady
            | EmbedEvent::ShutdownCompleted { .. } => Level::Info,
            EmbedEvent::OptionsChanged { .. }
            | EmbedEvent::CallbacksSkipped
            | EmbedEvent::ProcessInfoPublished { .. }
            | EmbedEvent::ShutdownStep { .. } => Level::Debug,
            EmbedEvent::CallbackBound { .. } => Level::Trace,
        }
    }

    /// Human-readable rendering
    pub fn describe(&self) -> String {
        match self {
            EmbedEvent::OptionsChanged { options } => {
                format!("[R] Startup options set to {:?}", options)
            },
            EmbedEvent::ExternalSession { marker_var } => {
                format!("[R] Already initialized in this process (per {})", marker_var)
            },
            EmbedEvent::BootstrapStarted { argc, r_home } => {
                format!("[R] Bootstrapping with {} options (R_HOME={})", argc, r_home)
            },
            EmbedEvent::BootstrapCompleted { status } => {
                format!("[R] Bootstrap returned {}", status)
            },
            EmbedEvent::CallbackBound {
                slot,
                runtime_default,
            } => {
                if *runtime_default {
                    format!("[R] {} left to runtime default", slot)
                } else {
                    format!("[R] {} bound", slot)
                }
            },
            EmbedEvent::CallbacksSkipped => "[R] Callback installation skipped".to_string(),
            EmbedEvent::MainLoopReady => "[R] Main loop ready".to_string(),
            EmbedEvent::ProcessInfoPublished { var, marker } => {
                format!("[R] Published {}={}", var, marker)
            },
            EmbedEvent::ShutdownStep { step } => format!("[R] Shutdown: {}", step),
            EmbedEvent::ShutdownCompleted { fatal } => {
                format!("[R] Ended (fatal={})", fatal)
            },
            EmbedEvent::ReinitializationRejected => {
                "[R] Re-initialization after end rejected".to_string()
            },
        }
    }

    /// JSON rendering
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// EventLog - per-handle event journal
pub struct EventLog {
    events: Mutex<Vec<(Instant, EmbedEvent)>>,
    enabled: AtomicBool,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Stop recording; events still reach the `log` facade
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record an event
    pub fn log(&self, event: EmbedEvent) {
        log::log!(target: "rhost_embed", event.level(), "{}", event.describe());

        if self.is_enabled() {
            self.events.lock().push((Instant::now(), event));
        }
    }

    /// All recorded events, oldest first
    pub fn events(&self) -> Vec<EmbedEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Journal as a JSON array
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.events.lock().iter().map(|(_, e)| e.to_json()).collect())
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
