//! Session configuration loading.
//!
//! A session config says where the save lives, how often the run loop
//! ticks, which autoplay strategy drives it and how raid rolls are seeded.
//! Every field has a default, so an empty `()` is a valid config file.

use std::path::{Path, PathBuf};

use hearth_core::Millis;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategies::StrategyKind;

/// Error type for config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for a headless session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Save file location.
    pub save_path: PathBuf,
    /// Milliseconds between ticks in the run loop.
    pub tick_interval_ms: Millis,
    /// Autoplay strategy for the run loop.
    pub strategy: StrategyKind,
    /// Seed for raid rolls; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("saves/hearthhold.json"),
            tick_interval_ms: 1_000,
            strategy: StrategyKind::Idle,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = SessionConfig::from_ron_str("()").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = SessionConfig::from_ron_str("(strategy: Greedy, seed: Some(9))").unwrap();
        assert_eq!(config.strategy, StrategyKind::Greedy);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.tick_interval_ms, 1_000);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = SessionConfig::from_ron_str("(tick_interval_ms: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = SessionConfig::from_ron_str("(strategy: Reckless)").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SessionConfig::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_shipped_default_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.ron");
        let config = SessionConfig::load(path).unwrap();
        assert_eq!(config, SessionConfig::default());
    }
}
