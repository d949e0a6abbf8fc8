//! Command modules for the rhostctl CLI.
//!
//! Each subcommand lives in its own file: an args struct, a report the
//! command produces, and a `run_*` entry point that prints it.

pub mod marker;
pub mod options;
pub mod run;
pub mod session;

pub use marker::run_marker;
pub use options::{run_options, OptionsArgs};
pub use run::{run_run, RunArgs};
pub use session::{run_session, SessionArgs};

use crate::error::Result;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
