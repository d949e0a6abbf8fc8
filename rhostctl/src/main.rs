//! rhostctl - inspect and exercise the embedded R lifecycle.
//!
//! Uses clap for argument parsing and dispatches to the command handlers
//! in [`commands`].

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    run_marker, run_options, run_run, run_session, OptionsArgs, RunArgs, SessionArgs,
};
use config::Config;
use error::{CtlError, Result};

/// rhostctl - embedded R lifecycle tool
///
/// Shows session markers and startup configuration, and runs a full
/// initialize/shutdown cycle against libR or a recording backend.
#[derive(Parser, Debug)]
#[command(name = "rhostctl")]
#[command(author = "Rhost Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and exercise the embedded R lifecycle", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "RHOSTCTL_VERBOSE")]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "RHOSTCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Disable color output
    #[arg(long, global = true, env = "RHOSTCTL_NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the rhostctl CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the R session marker and whether R already runs in this process
    Session(SessionCommand),

    /// Show the effective startup options and embedding configuration
    Options(OptionsCommand),

    /// Print the marker this process publishes after starting R
    Marker,

    /// Initialize R, then shut it down
    ///
    /// Without --dry-run this needs a build with the `libr` feature.
    Run(RunCommand),
}

/// Arguments for the session subcommand.
#[derive(Parser, Debug)]
struct SessionCommand {
    /// Parse this marker instead of reading the environment
    #[arg(short, long)]
    marker: Option<String>,

    /// Environment variable holding the marker
    #[arg(long)]
    var: Option<String>,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the options subcommand.
#[derive(Parser, Debug)]
struct OptionsCommand {
    /// Print JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the run subcommand.
#[derive(Parser, Debug)]
struct RunCommand {
    /// Use the recording backend and print the native call journal
    #[arg(long)]
    dry_run: bool,

    /// Do not install console callbacks
    #[arg(long)]
    no_callbacks: bool,

    /// Start R non-interactive
    #[arg(long)]
    non_interactive: bool,

    /// Value passed to Rf_endEmbeddedR
    #[arg(long)]
    fatal: Option<i32>,

    /// R installation directory
    #[arg(long, env = "RHOST_R_HOME")]
    r_home: Option<PathBuf>,

    /// Print JSON
    #[arg(long)]
    json: bool,

    /// Startup options, program name first
    #[arg(last = true)]
    options: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color).context("logging setup failed")?;

    let config = load_config(cli.config.as_deref()).context("cannot load configuration")?;

    execute_command(cli.command, cli.verbose, config)?;
    Ok(())
}

/// Initialize the logging system.
///
/// Logs go to stderr so JSON output on stdout stays parseable. Records from
/// the `log` facade are captured too.
fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| CtlError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

/// Execute the selected command.
fn execute_command(command: Commands, verbose: bool, config: Config) -> Result<()> {
    match command {
        Commands::Session(args) => run_session(SessionArgs {
            marker: args.marker,
            var: args.var,
            json: args.json,
        }),
        Commands::Options(args) => run_options(OptionsArgs { json: args.json }, &config.embed),
        Commands::Marker => run_marker(),
        Commands::Run(args) => execute_run(args, verbose || config.verbose, config),
    }
}

/// Execute the run command.
fn execute_run(args: RunCommand, verbose: bool, config: Config) -> Result<()> {
    let run_args = RunArgs {
        dry_run: args.dry_run || config.run.dry_run,
        no_callbacks: args.no_callbacks,
        non_interactive: args.non_interactive,
        fatal: args.fatal.unwrap_or(config.run.fatal),
        r_home: args.r_home,
        options: args.options,
        json: args.json,
        verbose,
    };
    run_run(run_args, config.embed)
}
