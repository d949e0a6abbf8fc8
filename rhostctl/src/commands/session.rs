//! Session command implementation.
//!
//! Parses a session marker (given, or read from the environment) and
//! reports whether it says R was already started by this process.

use rhost_embed::session::R_SESSION_INITIALIZED;
use rhost_embed::SessionStatus;
use serde::Serialize;

use crate::commands::print_json;
use crate::error::Result;

/// Arguments for the session command.
#[derive(Debug, Clone, Default)]
pub struct SessionArgs {
    /// Marker to parse instead of the environment variable.
    pub marker: Option<String>,
    /// Variable holding the marker; defaults to `R_SESSION_INITIALIZED`.
    pub var: Option<String>,
    /// Print JSON instead of text.
    pub json: bool,
}

/// What the session command reports.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub source: String,
    pub status: SessionStatus,
    pub externally_initialized: bool,
}

/// Build the report without printing it.
pub fn session_report(args: &SessionArgs) -> SessionReport {
    let var = args.var.as_deref().unwrap_or(R_SESSION_INITIALIZED);
    let (source, status) = match &args.marker {
        Some(marker) => (
            "--marker".to_string(),
            SessionStatus::parse(Some(marker), std::process::id()),
        ),
        None => (var.to_string(), SessionStatus::from_env_var(var)),
    };

    SessionReport {
        source,
        externally_initialized: status.is_externally_initialized(),
        status,
    }
}

/// Print the session report.
pub fn run_session(args: SessionArgs) -> Result<()> {
    let report = session_report(&args);
    tracing::debug!("session marker read from {}", report.source);

    if args.json {
        return print_json(&report);
    }

    println!("source: {}", report.source);
    for (key, value) in report.status.entries() {
        println!("  {} = {}", key, value);
    }
    for item in report.status.malformed() {
        println!("  skipped malformed item {:?}", item);
    }
    println!(
        "externally initialized: {}",
        if report.externally_initialized { "yes" } else { "no" }
    );
    Ok(())
}
