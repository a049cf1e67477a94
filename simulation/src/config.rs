//! Session configuration loaded from TOML.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use rampart_system_wave_scheduler::Config as SchedulerConfig;
use rampart_world::{EconomyConfig, LayoutError, MapLayout};
use serde::Deserialize;
use thiserror::Error;

/// Every tunable of a simulation session.
///
/// Missing sections and fields fall back to their defaults, so an empty
/// document describes the standard game.
///
/// ```toml
/// [economy]
/// starting_money = 500
///
/// [waves]
/// auto_wave = false
///
/// [map]
/// size = 12
/// turn_points = [{ column = 0, row = 1 }, { column = 11, row = 1 }]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Starting health and money.
    pub economy: EconomyConfig,
    /// Wave pacing.
    pub waves: WaveConfig,
    /// Map override; the standard map is used when absent.
    pub map: Option<MapLayout>,
}

/// Auto-wave pacing.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Starts the next main wave after a quiet period.
    pub auto_wave: bool,
    /// Quiet period, in seconds, before an automatic main wave.
    pub auto_wave_delay_secs: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            auto_wave: true,
            auto_wave_delay_secs: 10.0,
        }
    }
}

impl WaveConfig {
    pub(crate) fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        let delay = Duration::try_from_secs_f32(self.auto_wave_delay_secs)
            .map_err(|_| ConfigError::InvalidAutoWaveDelay(self.auto_wave_delay_secs))?;
        Ok(SchedulerConfig::new(self.auto_wave, delay))
    }
}

impl SimulationConfig {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks values that deserialization alone cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.waves.scheduler_config()?;
        if let Some(layout) = &self.map {
            let _ = layout.validate()?;
        }
        Ok(())
    }
}

/// Reasons a configuration cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    /// The map override describes an unusable map.
    #[error("invalid map layout")]
    Layout(#[from] LayoutError),
    /// The auto-wave delay is negative or not finite.
    #[error("auto-wave delay must be a finite, non-negative number of seconds, got {0}")]
    InvalidAutoWaveDelay(f32),
}
