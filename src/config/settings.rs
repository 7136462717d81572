//! Configuration settings for DealWatch.

use crate::engine::{Mode, ModeConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Evaluation engine configuration.
    pub engine: EngineSettings,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Classroom demo configuration.
    pub demo: DemoConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults.
    pub fn load_or_default() -> crate::Result<Self> {
        Self::load(None)
    }

    /// Load configuration from a TOML file layered with environment overrides.
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load(path: Option<PathBuf>) -> crate::Result<Self> {
        let config_path = path.unwrap_or_else(default_path);

        let settings = config::Config::builder()
            .add_source(config::File::from(config_path.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix(super::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<PathBuf>) -> crate::Result<()> {
        let config_path = path.unwrap_or_else(default_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::config(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.engine.promotion_threshold == 0 {
            return Err(crate::Error::config("promotion_threshold must be at least 1"));
        }
        if self.engine.consensus_threshold == 0 {
            return Err(crate::Error::config("consensus_threshold must be at least 1"));
        }
        if self.demo.deal_price <= Decimal::ZERO {
            return Err(crate::Error::config("demo.deal_price must be positive"));
        }
        Ok(())
    }
}

fn default_path() -> PathBuf {
    super::config_dir()
        .map(|p| p.join("config.toml"))
        .unwrap_or_else(|_| Path::new("config.toml").to_path_buf())
}

/// Evaluation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Operating mode at startup.
    pub mode: Mode,
    /// Votes required for promotion in centralized mode.
    pub promotion_threshold: u32,
    /// Same-verdict verifications required in decentralized mode.
    pub consensus_threshold: u32,
    /// Delay between submission and the single promotion check.
    pub promotion_delay_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Centralized,
            promotion_threshold: 5,
            consensus_threshold: 3,
            promotion_delay_ms: 30_000,
        }
    }
}

impl EngineSettings {
    /// Build the engine's initial mode configuration.
    pub fn mode_config(&self) -> ModeConfig {
        ModeConfig {
            mode: self.mode,
            promotion_threshold: self.promotion_threshold,
            consensus_threshold: self.consensus_threshold,
            promotion_delay: Duration::from_millis(self.promotion_delay_ms),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub filter: String,
    /// Also write logs to a daily rolling file.
    pub file_logging: bool,
    /// Override for the log directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "dealwatch=info".to_string(),
            file_logging: false,
            log_dir: None,
        }
    }
}

/// Classroom demo configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Deal title used in the scenario.
    pub deal_title: String,
    /// Deal category used in the scenario.
    pub deal_category: String,
    /// Deal price used in the scenario.
    pub deal_price: Decimal,
    /// Alert keyword phrase.
    pub alert_keywords: String,
    /// Alert maximum price.
    pub alert_max_price: Decimal,
    /// Alert minimum verification count.
    pub alert_min_verifications: u32,
    /// Votes cast before the promotion check in centralized mode.
    pub centralized_votes: u32,
    /// Valid verifications cast in decentralized mode.
    pub decentralized_verifications: u32,
    /// Promotion delay used by the demo, shorter than the production default.
    pub promotion_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            deal_title: "RTX 4080 $650".to_string(),
            deal_category: "Electronics".to_string(),
            deal_price: Decimal::new(650, 0),
            alert_keywords: "electronics".to_string(),
            alert_max_price: Decimal::new(700, 0),
            alert_min_verifications: 3,
            centralized_votes: 2,
            decentralized_verifications: 3,
            promotion_delay_ms: 2_000,
        }
    }
}
