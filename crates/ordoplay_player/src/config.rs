// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration, stored as RON.

use crate::error::{PlayerError, PlayerResult};
use crate::pacing::DEFAULT_PACING_TOLERANCE;
use ordoplay_flow::{PlaybackConfig, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Framerate applied to loaded projects
    pub framerate: f64,
    /// Fraction of a frame interval a tick may run late before the pacer drops frames
    pub pacing_tolerance: f64,
    /// Width used when neither the attribute nor the project sets one
    pub default_width: f64,
    /// Height used when neither the attribute nor the project sets one
    pub default_height: f64,
    /// Initial resolution multiplier
    pub quality: f64,
    /// Initial autoplay flag
    pub auto: bool,
    /// Playback settings for projects built by the player
    pub playback: PlaybackConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            framerate: 60.0,
            pacing_tolerance: DEFAULT_PACING_TOLERANCE,
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            quality: 1.0,
            auto: false,
            playback: PlaybackConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a RON document
    pub fn from_ron(content: &str) -> PlayerResult<Self> {
        let config: PlayerConfig =
            ron::from_str(content).map_err(|e| PlayerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a file
    pub fn load(path: &Path) -> PlayerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlayerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_ron(&content)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> PlayerResult<String> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        ron::ser::to_string_pretty(self, pretty).map_err(|e| PlayerError::Config(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> PlayerResult<()> {
        if !self.framerate.is_finite() || self.framerate <= 0.0 {
            return Err(PlayerError::Config(format!(
                "framerate must be positive, got {}",
                self.framerate
            )));
        }
        if !(0.0..=1.0).contains(&self.pacing_tolerance) {
            return Err(PlayerError::Config(format!(
                "pacing_tolerance must be within 0..=1, got {}",
                self.pacing_tolerance
            )));
        }
        if !self.quality.is_finite() || self.quality <= 0.0 {
            return Err(PlayerError::Config(format!(
                "quality must be positive, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}
