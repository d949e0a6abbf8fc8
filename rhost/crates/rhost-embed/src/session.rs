//! Session Coordinator
//!
//! Cross-process detection of an R session that is already running in this
//! process. A host that started R itself exports a marker of the form
//! `key1=value1:key2=value2` (see rstudio/reticulate#98); we read it, and we
//! publish the symmetric marker describing ourselves.
//!
//! The markers are advisory. Absent or stale variables simply mean "not
//! externally initialized".

use indexmap::IndexMap;
use serde::Serialize;

/// Variable exported by a process that initialized R
pub const R_SESSION_INITIALIZED: &str = "R_SESSION_INITIALIZED";

/// Variable this process publishes about itself
pub const RHOST_SESSION_INITIALIZED: &str = "RHOST_SESSION_INITIALIZED";

/// Separator between `key=value` items
pub const MARKER_DELIMITER: char = ':';

/// Key holding the reading process id
pub const CURRENT_PID_KEY: &str = "current_pid";

/// Key holding the id of the process that initialized R
pub const PID_KEY: &str = "PID";

/// Key holding the executable path of the publishing process
pub const EXECUTABLE_KEY: &str = "executable";

/// Parsed session marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    entries: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    malformed: Vec<String>,
}

impl SessionStatus {
    /// Read the marker from `R_SESSION_INITIALIZED`
    pub fn from_env() -> Self {
        Self::from_env_var(R_SESSION_INITIALIZED)
    }

    /// Read the marker from a named variable
    pub fn from_env_var(var: &str) -> Self {
        let marker = std::env::var(var).ok();
        Self::parse(marker.as_deref(), std::process::id())
    }

    /// Parse a marker for the process `current_pid`
    ///
    /// `current_pid` is inserted first, so a marker entry with the same key
    /// overrides it. Items without `=` are skipped with a warning and kept
    /// in [`malformed`](Self::malformed).
    pub fn parse(marker: Option<&str>, current_pid: u32) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(CURRENT_PID_KEY.to_string(), current_pid.to_string());
        let mut malformed = Vec::new();

        let Some(marker) = marker.filter(|m| !m.is_empty()) else {
            return Self { entries, malformed };
        };

        for item in marker.split(MARKER_DELIMITER) {
            match item.split_once('=') {
                Some((key, value)) => {
                    entries.insert(key.to_string(), value.to_string());
                },
                None => {
                    log::warn!(
                        "The item {:?} in the session marker should be of the form key=value.",
                        item
                    );
                    malformed.push(item.to_string());
                },
            }
        }

        Self { entries, malformed }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    /// Items that were not `key=value`
    pub fn malformed(&self) -> &[String] {
        &self.malformed
    }

    /// Did this very process initialize R before us
    ///
    /// Compared as strings so `"0005"`-style formatting differences in the
    /// marker do not matter beyond what the publisher wrote.
    pub fn is_externally_initialized(&self) -> bool {
        match (self.get(CURRENT_PID_KEY), self.get(PID_KEY)) {
            (Some(current), Some(owner)) => current == owner,
            _ => false,
        }
    }
}

/// `is_r_externally_initialized` against the process environment
pub fn is_externally_initialized() -> bool {
    SessionStatus::from_env().is_externally_initialized()
}

/// Join pairs into a `k=v:k=v` marker
pub fn encode_marker<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
        .collect::<Vec<_>>()
        .join(&MARKER_DELIMITER.to_string())
}

/// Marker describing this process
pub fn process_marker() -> String {
    let executable = std::env::current_exe()
        .map(|path| path.display().to_string())
        .unwrap_or_default();

    encode_marker(&[
        (CURRENT_PID_KEY, std::process::id().to_string()),
        (EXECUTABLE_KEY, executable),
    ])
}

/// Publish this process' marker under `RHOST_SESSION_INITIALIZED`
pub fn publish_process_info() -> String {
    publish_process_info_to(RHOST_SESSION_INITIALIZED)
}

/// Publish this process' marker under a named variable
pub fn publish_process_info_to(var: &str) -> String {
    let marker = process_marker();
    log::debug!("publishing {}={}", var, marker);
    std::env::set_var(var, &marker);
    marker
}
