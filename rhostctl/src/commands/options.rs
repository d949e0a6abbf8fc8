//! Options command implementation.
//!
//! Shows the startup options and embedding configuration a run would use.

use rhost_embed::EmbedConfig;

use crate::commands::print_json;
use crate::error::Result;

/// Arguments for the options command.
#[derive(Debug, Clone, Default)]
pub struct OptionsArgs {
    /// Print the whole embedding configuration as JSON.
    pub json: bool,
}

/// Print the effective configuration.
pub fn run_options(args: OptionsArgs, config: &EmbedConfig) -> Result<()> {
    if args.json {
        return print_json(config);
    }

    println!("options: {}", config.options.join(" "));
    println!(
        "r_home: {}",
        config
            .r_home
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(R_HOME or `R RHOME`)".to_string())
    );
    println!("interactive: {}", config.interactive);
    println!("install_callbacks: {}", config.install_callbacks);
    println!(
        "interface_mode: {}",
        serde_json::to_value(config.interface_mode)?
            .as_str()
            .unwrap_or_default()
    );
    println!("session_marker_var: {}", config.session_marker_var);
    println!("publish_var: {}", config.publish_var);
    Ok(())
}
