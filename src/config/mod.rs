//! Configuration management for DealWatch.

mod settings;

pub use settings::{Config, DemoConfig, EngineSettings, LoggingConfig};

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Prefix for environment overrides, e.g. `DEALWATCH__ENGINE__MODE=decentralized`.
pub const ENV_PREFIX: &str = "DEALWATCH";

/// Get the configuration directory path.
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "dealwatch", "dealwatch")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| Error::config("Could not determine config directory"))
}

/// Get the log directory path.
pub fn log_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "dealwatch", "dealwatch")
        .map(|dirs| dirs.data_dir().join("logs"))
        .ok_or_else(|| Error::config("Could not determine log directory"))
}
