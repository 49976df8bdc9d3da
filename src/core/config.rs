/// Feed configuration: history bound, gesture timing, and audio output.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::sound::SoundBank;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level settings for a [`FeedController`](crate::core::feed::FeedController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Maximum number of displayed entries before the oldest start fading.
    pub history_limit: usize,
    /// How long a press must be held to count as a long press.
    pub long_press_ms: u64,
    /// Consecutive at-bottom frames required before expired entries are
    /// detached.
    pub settle_frames: u32,
    pub audio: AudioConfig,
    pub sounds: SoundBank,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            history_limit: 40,
            long_press_ms: 400,
            settle_frames: 3,
            audio: AudioConfig::default(),
            sounds: SoundBank::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub master_gain: f32,
    pub lowpass_hz: f32,
    pub asset_root: String,
    pub asset_extension: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_gain: 0.5,
            lowpass_hz: 550.0,
            asset_root: "../assets/".to_string(),
            asset_extension: ".mp3".to_string(),
        }
    }
}

impl AudioConfig {
    pub fn clip_url(&self, path: &str) -> String {
        format!("{}{}{}", self.asset_root, path, self.asset_extension)
    }
}

impl FeedConfig {
    /// Parse a configuration from a RON string. Missing fields take their
    /// defaults.
    pub fn parse_ron(input: &str) -> Result<FeedConfig, ConfigError> {
        let config: FeedConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_ron(path: &Path) -> Result<FeedConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "history_limit must be at least 1".to_string(),
            ));
        }
        if self.settle_frames == 0 {
            return Err(ConfigError::Invalid(
                "settle_frames must be at least 1".to_string(),
            ));
        }
        if self.sounds.palette.is_empty() {
            return Err(ConfigError::Invalid(
                "sound palette must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
