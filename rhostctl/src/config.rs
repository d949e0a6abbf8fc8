//! Configuration module for the rhostctl CLI.
//!
//! Loads `rhost.toml`; its `[embed]` table is the embedding configuration
//! handed to the runtime.

use dirs::{config_dir, home_dir};
use rhost_embed::EmbedConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CtlError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "rhost.toml";

/// Application configuration structure.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Global verbose setting.
    #[serde(default)]
    pub verbose: bool,

    /// Embedding configuration.
    #[serde(default)]
    pub embed: EmbedConfig,

    /// Run-specific configuration.
    #[serde(default)]
    pub run: RunConfig,
}

/// Run-specific configuration options.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Value passed to `Rf_endEmbeddedR`.
    #[serde(default)]
    pub fatal: i32,

    /// Use the recording backend unless told otherwise.
    #[serde(default)]
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Searches for configuration in the following order:
    /// 1. Current directory
    /// 2. `~/.config/rhost/`
    /// 3. System configuration directory
    ///
    /// Without a file, the embedding configuration comes from the
    /// `RHOST_*` environment variables.
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self {
                embed: EmbedConfig::from_env(),
                ..Default::default()
            }),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CtlError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CtlError::Config(format!("Failed to parse configuration: {}", e)))?;

        config
            .embed
            .validate()
            .map_err(|e| CtlError::Config(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    fn check_home_config() -> Option<PathBuf> {
        home_dir()
            .map(|dir| dir.join(".config").join("rhost").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    fn check_system_config() -> Option<PathBuf> {
        config_dir()
            .map(|dir| dir.join("rhost").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::check_current_dir_config()
            .or_else(Self::check_home_config)
            .or_else(Self::check_system_config)
    }
}
