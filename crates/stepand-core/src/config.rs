//! Configuration types for walks and the simulator
//!
//! Durations are written in humantime form (`"2s"`, `"20m"`) when the
//! configuration is serialized.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, StepandError};
use crate::geo::Coordinate;
use crate::story::Genre;

/// Default grace period before a mission in range auto-completes
pub const DEFAULT_DWELL_DELAY: Duration = Duration::from_secs(2);

/// Default location sample interval
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepandConfig {
    /// Walk session configuration
    #[serde(default)]
    pub walk: WalkConfig,
    /// Simulated route configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StepandConfig {
    /// Load from a JSON file; missing sections fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StepandError::ConfigNotFound(path.display().to_string()),
            _ => StepandError::from(e),
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check all sections
    pub fn validate(&self) -> Result<()> {
        self.walk.validate()?;
        self.simulation.validate()
    }
}

/// Walk session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Story genre
    pub genre: Genre,
    /// Walk length chosen during setup
    #[serde(with = "humantime_serde")]
    pub planned_duration: Duration,
    /// Time in range before a mission auto-completes
    #[serde(with = "humantime_serde")]
    pub dwell_delay: Duration,
    /// Complete missions automatically after the dwell delay
    pub auto_complete: bool,
    /// Walk clock tick interval
    #[serde(with = "humantime_serde")]
    pub clock_interval: Duration,
    /// Capacity of the event broadcast channel
    pub event_buffer: usize,
    /// Capacity of the command channel
    pub command_buffer: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            genre: Genre::default(),
            planned_duration: Duration::from_secs(20 * 60),
            dwell_delay: DEFAULT_DWELL_DELAY,
            auto_complete: true,
            clock_interval: Duration::from_secs(1),
            event_buffer: 256,
            command_buffer: 32,
        }
    }
}

impl WalkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.clock_interval.is_zero() {
            return Err(StepandError::InvalidConfig("clock_interval must be non-zero".into()));
        }
        if self.event_buffer == 0 || self.command_buffer == 0 {
            return Err(StepandError::InvalidConfig("channel buffers must be non-zero".into()));
        }
        Ok(())
    }
}

/// Simulated route configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Start location
    pub start: Coordinate,
    /// Walking speed in meters per second
    pub speed_mps: f64,
    /// Interval between location samples
    #[serde(with = "humantime_serde")]
    pub sample_interval: Duration,
    /// Maximum GPS noise added to each sample, in meters
    pub jitter_m: f64,
    /// Seed for the noise generator
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            // Tokyo Station
            start: Coordinate::from_static(35.6812, 139.7671),
            speed_mps: 1.4,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            jitter_m: 0.0,
            seed: 7,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.speed_mps.is_finite() || self.speed_mps <= 0.0 {
            return Err(StepandError::InvalidConfig(format!(
                "speed_mps must be positive, got {}",
                self.speed_mps
            )));
        }
        if self.sample_interval.is_zero() {
            return Err(StepandError::InvalidConfig("sample_interval must be non-zero".into()));
        }
        if !self.jitter_m.is_finite() || self.jitter_m < 0.0 {
            return Err(StepandError::InvalidConfig(format!(
                "jitter_m must be non-negative, got {}",
                self.jitter_m
            )));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

// Helper module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
