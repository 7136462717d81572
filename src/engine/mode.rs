//! Operating mode and thresholds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which aggregation model decides deal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Votes plus a single delayed promotion check.
    #[default]
    Centralized,
    /// Peer verification with a consensus threshold.
    Decentralized,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Centralized => write!(f, "centralized"),
            Self::Decentralized => write!(f, "decentralized"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "centralized" => Ok(Self::Centralized),
            "decentralized" => Ok(Self::Decentralized),
            other => Err(crate::Error::validation(format!(
                "Unknown mode '{}', expected 'centralized' or 'decentralized'",
                other
            ))),
        }
    }
}

/// Mode and thresholds consumed by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Current mode.
    pub mode: Mode,
    /// Votes needed for promotion.
    pub promotion_threshold: u32,
    /// Same-verdict verifications needed for consensus.
    pub consensus_threshold: u32,
    /// Delay before the promotion check runs.
    #[serde(rename = "promotion_delay_ms", with = "duration_ms")]
    pub promotion_delay: Duration,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Centralized,
            promotion_threshold: 5,
            consensus_threshold: 3,
            promotion_delay: Duration::from_secs(30),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Owns the mode configuration for one engine.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    config: ModeConfig,
}

impl ModeController {
    pub fn new(config: ModeConfig) -> Self {
        Self { config }
    }

    /// Replace the mode. Thresholds are untouched.
    pub fn set_mode(&mut self, mode: Mode) -> ModeConfig {
        self.config.mode = mode;
        self.config
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ModeConfig {
        self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }
}
