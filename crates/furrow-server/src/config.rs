//! Coordinator configuration

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use furrow_core::constants::STARTING_CAPITAL;
use serde::{Deserialize, Serialize};

/// Coordinator configuration, loaded from YAML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Attempts per read-modify-write unit before giving up on CAS conflicts
    #[serde(default = "default_max_transaction_attempts")]
    pub max_transaction_attempts: u32,

    /// Time players get to submit each round
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,

    /// How long a lobby may wait for its human seats
    #[serde(default = "default_lobby_ttl_secs")]
    pub lobby_ttl_secs: u64,

    /// Deadline sweep period
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_starting_capital")]
    pub starting_capital: f64,

    /// Maximum seats (humans + AI) per game
    #[serde(default = "default_max_players")]
    pub max_players: u32,

    #[serde(default = "default_min_rounds")]
    pub min_rounds: u32,

    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

fn default_max_transaction_attempts() -> u32 {
    8
}
fn default_round_timeout_secs() -> u64 {
    24 * 60 * 60
}
fn default_lobby_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}
fn default_sweep_interval_secs() -> u64 {
    60
}
fn default_starting_capital() -> f64 {
    STARTING_CAPITAL
}
fn default_max_players() -> u32 {
    12
}
fn default_min_rounds() -> u32 {
    10
}
fn default_max_rounds() -> u32 {
    50
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_transaction_attempts: default_max_transaction_attempts(),
            round_timeout_secs: default_round_timeout_secs(),
            lobby_ttl_secs: default_lobby_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            starting_capital: default_starting_capital(),
            max_players: default_max_players(),
            min_rounds: default_min_rounds(),
            max_rounds: default_max_rounds(),
        }
    }
}

impl CoordinatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.round_timeout_secs)
    }

    pub fn lobby_ttl(&self) -> Duration {
        Duration::from_secs(self.lobby_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: CoordinatorConfig =
            serde_yaml::from_str("round_timeout_secs: 30\nmax_players: 4\n").unwrap();
        assert_eq!(config.round_timeout_secs, 30);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.max_transaction_attempts, 8);
        assert_eq!(config.min_rounds, 10);
        assert_eq!(config.max_rounds, 50);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config =
            CoordinatorConfig::load_or_default(Path::new("/nonexistent/furrow.yaml")).unwrap();
        assert_eq!(config, CoordinatorConfig::default());
    }
}
