//! Configuration management for CrabPose
//!
//! Provides loading, saving, and validation of the thresholds that drive
//! pose validation, stability gating, the capture countdown, and sample
//! smoothing.

use crate::errors::PoseError;
use crate::profile::DetectionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrabPoseConfig {
    pub validation: ValidationConfig,
    pub detection: DetectionPolicy,
    pub countdown: CountdownConfig,
    pub smoothing: SmoothingConfig,
}

/// Orientation and aggregate scoring thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Averaged orientation progress below this is reported as Invalid
    pub low_progress_threshold: f64,
    /// Combined orientation/detection progress below this is reported as Invalid
    pub aggregate_invalid_threshold: f64,
    /// Progress reaches zero at this multiple of the tolerance
    pub progress_falloff: f64,
    /// Seconds a Valid pose must be held before it becomes Locked
    pub stability_threshold_secs: f64,
    /// Samples older than this (seconds) are treated as absent
    pub stale_sample_secs: f64,
}

/// Auto-capture countdown settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Number of countdown steps (3 means 3, 2, 1)
    pub steps: u32,
    /// Delay between steps in milliseconds
    pub step_interval_ms: u64,
    /// Abort the countdown when the pose drops below Valid
    pub abort_on_degrade: bool,
}

/// Exponential smoothing applied to orientation samples before validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub enabled: bool,
    /// Weight of the newest sample, in (0, 1]
    pub alpha: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            low_progress_threshold: 0.2,
            aggregate_invalid_threshold: 0.1,
            progress_falloff: 3.0,
            stability_threshold_secs: 0.5,
            stale_sample_secs: 0.5,
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            steps: 3,
            step_interval_ms: 1000,
            abort_on_degrade: true,
        }
    }
}

impl CountdownConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    /// The same countdown played back `speed` times faster. Intervals never
    /// drop below one millisecond.
    pub fn scaled(self, speed: f64) -> Self {
        let ms = (self.step_interval_ms as f64 / speed).round().max(1.0) as u64;
        Self {
            step_interval_ms: ms,
            ..self
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            alpha: 0.5,
        }
    }
}

impl Default for CrabPoseConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            detection: DetectionPolicy::default(),
            countdown: CountdownConfig::default(),
            smoothing: SmoothingConfig::default(),
        }
    }
}

impl CrabPoseConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PoseError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| PoseError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: CrabPoseConfig = toml::from_str(&contents)
            .map_err(|e| PoseError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(PoseError::ConfigError)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PoseError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PoseError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| PoseError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| PoseError::ConfigError(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabpose.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let v = &self.validation;
        if !(0.0..1.0).contains(&v.low_progress_threshold) {
            return Err("low_progress_threshold must be in [0.0, 1.0)".to_string());
        }
        if !(0.0..1.0).contains(&v.aggregate_invalid_threshold) {
            return Err("aggregate_invalid_threshold must be in [0.0, 1.0)".to_string());
        }
        if v.progress_falloff <= 1.0 {
            return Err("progress_falloff must be greater than 1.0".to_string());
        }
        if v.stability_threshold_secs < 0.0 {
            return Err("stability_threshold_secs must not be negative".to_string());
        }
        if v.stale_sample_secs <= 0.0 {
            return Err("stale_sample_secs must be positive".to_string());
        }

        self.detection.validate()?;

        if self.countdown.steps == 0 || self.countdown.steps > 10 {
            return Err("Countdown steps must be between 1 and 10".to_string());
        }
        if self.countdown.step_interval_ms > 10_000 {
            return Err("Countdown step interval must be at most 10000 ms".to_string());
        }

        if !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return Err("Smoothing alpha must be in (0.0, 1.0]".to_string());
        }

        Ok(())
    }
}
