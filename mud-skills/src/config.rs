//! Engine tuning loaded alongside game content.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunable constants of skill resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A practice roll at or above this improves second attack by one point.
    pub practice_threshold: i32,

    /// Highest train level practice can reach. `None` lets it grow past 100.
    pub train_cap: Option<i32>,

    /// Wait added by a successful sneak when the skill has no wait cost.
    pub default_sneak_wait: u32,

    /// Whether backstab narrates to the attacker and the target.
    pub narrate_backstab: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            practice_threshold: 95,
            train_cap: Some(100),
            default_sneak_wait: 1,
            narrate_backstab: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_practice_threshold(mut self, threshold: i32) -> Self {
        self.practice_threshold = threshold;
        self
    }

    pub fn with_train_cap(mut self, cap: Option<i32>) -> Self {
        self.train_cap = cap;
        self
    }

    pub fn with_default_sneak_wait(mut self, wait: u32) -> Self {
        self.default_sneak_wait = wait;
        self
    }

    pub fn with_backstab_narration(mut self, narrate: bool) -> Self {
        self.narrate_backstab = narrate;
        self
    }

    /// Parse from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(cap) = self.train_cap {
            if !(1..=100).contains(&cap) {
                return Err(ConfigError::Invalid(format!(
                    "train_cap must be between 1 and 100, got {cap}"
                )));
            }
        }
        Ok(())
    }

    /// Train level after one point of practice. A level already at or past
    /// the cap stays where it is.
    pub fn grow_train(&self, train_level: i32) -> i32 {
        match self.train_cap {
            Some(cap) if train_level >= cap => train_level,
            _ => train_level + 1,
        }
    }
}
