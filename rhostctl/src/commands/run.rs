//! Run command implementation.
//!
//! Drives one full lifecycle: options, initialize, bind environments,
//! shutdown. With `--dry-run` the recording backend stands in for libR and
//! the native call journal is printed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rhost_embed::{
    EmbedConfig, InitOutcome, NativeCall, NativeRuntime, RecordingRuntime, RuntimeHandle,
    ShutdownOutcome,
};
use serde::Serialize;

use crate::commands::print_json;
use crate::error::Result;

/// Arguments for the run command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Use the recording backend.
    pub dry_run: bool,
    /// Skip callback installation.
    pub no_callbacks: bool,
    /// Start R non-interactive.
    pub non_interactive: bool,
    /// Value passed to `Rf_endEmbeddedR`.
    pub fatal: i32,
    /// R installation directory, overriding the configuration.
    pub r_home: Option<PathBuf>,
    /// Startup options replacing the configured ones.
    pub options: Vec<String>,
    /// Print JSON instead of text.
    pub json: bool,
    /// Enable verbose output.
    pub verbose: bool,
}

/// What the run command reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub backend: &'static str,
    pub options: Vec<String>,
    pub init: InitOutcome,
    pub environments: usize,
    pub shutdown: ShutdownOutcome,
    /// Native call journal; only the recording backend keeps one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<Vec<NativeCall>>,
    pub events: serde_json::Value,
}

/// Run command handler.
pub struct RunCommand {
    args: RunArgs,
    config: EmbedConfig,
}

impl RunCommand {
    /// Create a new RunCommand; flags override `config`.
    pub fn new(args: RunArgs, mut config: EmbedConfig) -> Self {
        if let Some(r_home) = &args.r_home {
            config.r_home = Some(r_home.clone());
        }
        if args.no_callbacks {
            config.install_callbacks = false;
        }
        if args.non_interactive {
            config.interactive = false;
        }
        Self { args, config }
    }

    /// Execute the lifecycle and collect the report.
    pub fn execute(&self) -> Result<RunReport> {
        if self.args.dry_run {
            let recording = Arc::new(RecordingRuntime::new());
            let mut report = self.drive(recording.clone())?;
            report.calls = Some(recording.calls());
            Ok(report)
        } else {
            self.drive(linked_backend()?)
        }
    }

    fn drive(&self, native: Arc<dyn NativeRuntime>) -> Result<RunReport> {
        let backend = native.name();
        let runtime = RuntimeHandle::with_config(native, self.config.clone())?;

        if !self.args.options.is_empty() {
            runtime.set_options(self.args.options.iter().cloned())?;
        }

        let init = runtime.start()?;
        tracing::info!("initialize: {:?}", init);

        let environments = runtime.bind_environments()?;
        let shutdown = runtime.shutdown(self.args.fatal)?;
        tracing::info!("shutdown: {:?}", shutdown);

        Ok(RunReport {
            backend,
            options: runtime.options(),
            init,
            environments,
            shutdown,
            calls: None,
            events: runtime.events().to_json(),
        })
    }

    /// Execute and print.
    pub fn run(&self) -> Result<()> {
        let start_time = Instant::now();
        let report = self.execute()?;

        if self.args.json {
            print_json(&report)?;
        } else {
            print_report(&report);
        }

        if self.args.verbose {
            eprintln!("Completed in {:.2}s", start_time.elapsed().as_secs_f64());
        }
        Ok(())
    }
}

#[cfg(feature = "libr")]
fn linked_backend() -> Result<Arc<dyn NativeRuntime>> {
    Ok(Arc::new(rhost_embed::native::LibR::new()))
}

#[cfg(not(feature = "libr"))]
fn linked_backend() -> Result<Arc<dyn NativeRuntime>> {
    Err(crate::error::CtlError::Unsupported(
        "built without the `libr` feature; use --dry-run".to_string(),
    ))
}

fn print_report(report: &RunReport) {
    println!("backend: {}", report.backend);
    println!("options: {}", report.options.join(" "));
    match report.init {
        InitOutcome::Started { status } => println!("initialize: started (status {})", status),
        InitOutcome::AlreadyInitialized => println!("initialize: already initialized"),
        InitOutcome::External => println!("initialize: external session"),
    }
    println!("environments bound: {}", report.environments);
    let shutdown = match report.shutdown {
        ShutdownOutcome::Ended => "ended",
        ShutdownOutcome::AlreadyEnded => "already ended",
        ShutdownOutcome::NotStarted => "not started",
        ShutdownOutcome::Detached => "detached",
    };
    println!("shutdown: {}", shutdown);

    if let Some(calls) = &report.calls {
        println!("native calls:");
        for call in calls {
            println!("  {}", call.symbol());
        }
    }
}

/// Run the lifecycle with `config` and print the report.
pub fn run_run(args: RunArgs, config: EmbedConfig) -> Result<()> {
    RunCommand::new(args, config).run()
}
