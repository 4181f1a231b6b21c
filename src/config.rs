//! Application configuration management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::gesture::Thresholds;
use crate::worker::WorkerSettings;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gesture recognition configuration
    #[serde(default)]
    pub gesture: GestureConfig,

    /// Frame source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Player configuration
    #[serde(default)]
    pub player: PlayerConfig,
}

/// Gesture recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Minimum seconds between two dispatches of the same gesture
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: f64,

    /// Wrist travel between frames, as a fraction of frame width, for next/prev
    #[serde(default = "default_threshold")]
    pub horizontal_threshold: f32,

    /// Wrist travel between frames, as a fraction of frame height, for volume
    #[serde(default = "default_threshold")]
    pub vertical_threshold: f32,

    /// Pending gesture notifications kept for the UI
    #[serde(default = "default_capacity")]
    pub channel_capacity: usize,

    /// Delay before polling the camera again when no frame was ready
    #[serde(default = "default_retry_ms")]
    pub retry_interval_ms: u64,
}

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in demo hand
    #[default]
    Synthetic,
    /// Recorded landmark trace
    Replay,
}

/// Frame source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Landmark trace for the replay source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Pause between frames
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// Restart the trace when it runs out
    #[serde(default)]
    pub loop_trace: bool,

    /// Seed for the synthetic hand's jitter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Player configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume level (0-100)
    #[serde(default = "default_volume")]
    pub volume: u8,

    /// Volume change per gesture or key press
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,

    /// Playlist
    #[serde(default)]
    pub tracks: Vec<String>,
}

fn default_cooldown() -> f64 {
    3.0
}

fn default_threshold() -> f32 {
    0.05
}

fn default_capacity() -> usize {
    8
}

fn default_retry_ms() -> u64 {
    10
}

fn default_frame_interval() -> u64 {
    33
}

fn default_volume() -> u8 {
    75
}

fn default_volume_step() -> u8 {
    10
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            horizontal_threshold: default_threshold(),
            vertical_threshold: default_threshold(),
            channel_capacity: default_capacity(),
            retry_interval_ms: default_retry_ms(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            path: None,
            frame_interval_ms: default_frame_interval(),
            loop_trace: false,
            seed: None,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            volume_step: default_volume_step(),
            tracks: Vec::new(),
        }
    }
}

impl GestureConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }

    /// Settings handed to the gesture worker.
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            thresholds: Thresholds {
                horizontal: self.horizontal_threshold,
                vertical: self.vertical_threshold,
            },
            cooldown: self.cooldown(),
            channel_capacity: self.channel_capacity,
            retry_interval: Duration::from_millis(self.retry_interval_ms),
        }
    }
}

impl SourceConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Config {
    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| eyre!("Could not determine config directory"))?;

        Ok(config_dir.join("gesture-deck").join("config.toml"))
    }

    /// Load configuration from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a file the user named. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Could not read config file {}: {}", path.display(), e))?;
        Self::parse(&contents)
    }

    /// Parse TOML configuration.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;

        // Clamp volume to valid range (0-100)
        config.player.volume = config.player.volume.min(100);

        Ok(config)
    }

    /// Reject values the gesture pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let gesture = &self.gesture;

        if !gesture.cooldown_secs.is_finite() || gesture.cooldown_secs <= 0.0 {
            return Err(eyre!(
                "gesture.cooldown_secs must be a positive number, got {}",
                gesture.cooldown_secs
            ));
        }

        for (name, value) in [
            ("horizontal_threshold", gesture.horizontal_threshold),
            ("vertical_threshold", gesture.vertical_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(eyre!("gesture.{name} must be zero or positive, got {value}"));
            }
        }

        if gesture.channel_capacity < 2 {
            return Err(eyre!(
                "gesture.channel_capacity must be at least 2, got {}",
                gesture.channel_capacity
            ));
        }

        if self.source.kind == SourceKind::Replay && self.source.path.is_none() {
            return Err(eyre!("source.path is required for the replay source"));
        }

        Ok(())
    }
}
