//! Configuration Module - Embedding Parameters
//!
//! Everything the sequencers need to know before R starts: where R lives,
//! which flags to pass it, and how callbacks are sourced.

use crate::error::{EmbedError, Result};
use crate::options::{validate_options, DEFAULT_OPTIONS};
use crate::session::{RHOST_SESSION_INITIALIZED, R_SESSION_INITIALIZED};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// How callback implementations were bound at build time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceMode {
    /// Binary-call mode: Rust trampolines
    #[default]
    Abi,
    /// Declarative mode: implementations compiled into the interface library
    Api,
}

impl InterfaceMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abi" => Some(InterfaceMode::Abi),
            "api" => Some(InterfaceMode::Api),
            _ => None,
        }
    }
}

/// Embedding configuration
///
/// # Examples
///
/// ```rust
/// use rhost_embed::EmbedConfig;
///
/// let config = EmbedConfig {
///     options: vec!["myhost".into(), "--vanilla".into()],
///     interactive: false,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// R installation directory
    ///
    /// Default: `R_HOME`, then `R RHOME`
    pub r_home: Option<PathBuf>,

    /// Startup options, program name first
    ///
    /// Default: `["rhost", "--quiet", "--no-save"]`
    pub options: Vec<String>,

    /// Value for `R_Interactive`
    ///
    /// Default: true
    pub interactive: bool,

    /// Install the callback table at bootstrap
    ///
    /// Default: true
    pub install_callbacks: bool,

    /// Callback source
    ///
    /// Default: `abi`
    pub interface_mode: InterfaceMode,

    /// Variable read to detect an R session started by this process' host
    pub session_marker_var: String,

    /// Variable this process' marker is published under
    pub publish_var: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            r_home: None,
            options: DEFAULT_OPTIONS.iter().map(|s| s.to_string()).collect(),
            interactive: true,
            install_callbacks: true,
            interface_mode: InterfaceMode::Abi,
            session_marker_var: R_SESSION_INITIALIZED.to_string(),
            publish_var: RHOST_SESSION_INITIALIZED.to_string(),
        }
    }
}

impl EmbedConfig {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.options.is_empty() {
            return Err(ConfigError::EmptyOptions);
        }

        validate_options(&self.options)
            .map_err(|e| ConfigError::InvalidOptions(e.to_string()))?;

        if self.session_marker_var.is_empty() || self.session_marker_var.contains('=') {
            return Err(ConfigError::InvalidVariable(self.session_marker_var.clone()));
        }

        if self.publish_var.is_empty() || self.publish_var.contains('=') {
            return Err(ConfigError::InvalidVariable(self.publish_var.clone()));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with:
    /// - RHOST_R_HOME
    /// - RHOST_OPTIONS (whitespace separated)
    /// - RHOST_INTERACTIVE
    /// - RHOST_NO_CALLBACKS
    /// - RHOST_INTERFACE_MODE (`abi` or `api`)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RHOST_R_HOME") {
            if !val.is_empty() {
                config.r_home = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("RHOST_OPTIONS") {
            let options: Vec<String> = val.split_whitespace().map(str::to_string).collect();
            if !options.is_empty() {
                config.options = options;
            }
        }

        if let Ok(val) = std::env::var("RHOST_INTERACTIVE") {
            config.interactive = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("RHOST_NO_CALLBACKS") {
            config.install_callbacks = !parse_flag(&val);
        }

        if let Ok(val) = std::env::var("RHOST_INTERFACE_MODE") {
            match InterfaceMode::parse(&val) {
                Some(mode) => config.interface_mode = mode,
                None => log::warn!("ignoring RHOST_INTERFACE_MODE={:?}", val),
            }
        }

        config
    }

    /// Locate the R installation
    pub fn resolve_r_home(&self) -> Result<PathBuf> {
        resolve_r_home(self.r_home.as_deref())
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true") || val.eq_ignore_ascii_case("yes")
}

/// Locate the R installation
///
/// Order: `explicit`, then `R_HOME`, then the output of `R RHOME`.
pub fn resolve_r_home(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return existing_dir(path.to_path_buf(), "configured r_home");
    }

    if let Some(val) = std::env::var_os("R_HOME").filter(|v| !v.is_empty()) {
        return existing_dir(PathBuf::from(val), "R_HOME");
    }

    let output = Command::new("R")
        .args(["RHOME"])
        .output()
        .map_err(|e| EmbedError::RHomeNotFound(format!("cannot run `R RHOME`: {}", e)))?;

    if !output.status.success() {
        return Err(EmbedError::RHomeNotFound(format!(
            "`R RHOME` exited with {}",
            output.status
        )));
    }

    let home = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if home.is_empty() {
        return Err(EmbedError::RHomeNotFound("`R RHOME` printed nothing".to_string()));
    }
    existing_dir(PathBuf::from(home), "`R RHOME`")
}

fn existing_dir(path: PathBuf, origin: &str) -> Result<PathBuf> {
    if path.is_dir() {
        Ok(path)
    } else {
        Err(EmbedError::RHomeNotFound(format!(
            "{} {} is not a directory",
            origin,
            path.display()
        )))
    }
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("At least the program name is required in options")]
    EmptyOptions,

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Invalid environment variable name: {0:?}")]
    InvalidVariable(String),
}
