//! Marker command implementation.
//!
//! Prints the marker this process would publish after starting R.

use rhost_embed::session::process_marker;

use crate::error::Result;

/// Print this process' session marker.
pub fn run_marker() -> Result<()> {
    println!("{}", process_marker());
    Ok(())
}
