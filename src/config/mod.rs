//! Configuration module for vibscope
//!
//! This module handles application configuration including:
//! - Serial link parameters and the sensor model
//! - Acquisition parameters (history capacity, live window span, tick rate)
//! - Display limits for the waveform chart
//! - Log output
//!
//! # Config Location
//!
//! The default configuration file lives in the platform config directory:
//! - **Linux**: `~/.config/vibscope/config.toml`
//! - **macOS**: `~/Library/Application Support/vibscope/config.toml`
//! - **Windows**: `%APPDATA%\vibscope\config.toml`
//!
//! Every section and field has a default, so a partial (or missing) file is
//! valid.
//!
//! # Example
//!
//! ```ignore
//! use vibscope::config::AppConfig;
//!
//! let mut config = AppConfig::load_or_default();
//! config.serial.port_name = Some("/dev/ttyUSB0".into());
//! config.validate()?;
//! config.save(vibscope::config::default_config_path().unwrap())?;
//! ```

use crate::error::{Result, VibError};
use crate::types::{SensorModel, LIVE_VIEW_WINDOW, MAX_HISTORY_POINTS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "vibscope";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default render tick interval (~60 Hz)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Default number of log lines kept for display
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port to open (e.g. `/dev/ttyUSB0`, `COM3`)
    pub port_name: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Connected sensor model
    pub model: SensorModel,
    /// Read timeout; bounds how long cancellation of the read loop can take
    pub read_timeout_ms: u64,
    /// Size of the buffer used for each read
    pub read_chunk_size: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: None,
            baud_rate: DEFAULT_BAUD_RATE,
            model: SensorModel::default(),
            read_timeout_ms: 10,
            read_chunk_size: 1024,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Acquisition and buffering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Maximum history entries kept per run
    pub history_capacity: usize,
    /// Live-follow window span in sample positions
    pub window_span: u64,
    /// Interval between render ticks
    pub tick_interval_ms: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            history_capacity: MAX_HISTORY_POINTS,
            window_span: LIVE_VIEW_WINDOW,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl AcquisitionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Waveform chart limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Lower bound of the acceleration axis in g
    pub y_min: f64,
    /// Upper bound of the acceleration axis in g
    pub y_max: f64,
    /// Narrowest span a user zoom may reach
    pub min_zoom_span: u64,
    /// Widest span a user zoom may reach
    pub max_zoom_span: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            y_min: -2.0,
            y_max: 2.0,
            min_zoom_span: 50,
            max_zoom_span: MAX_HISTORY_POINTS as u64,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Optional file receiving a copy of all tracing output
    pub file: Option<PathBuf>,
    /// Number of user-facing log lines kept
    pub log_capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub acquisition: AcquisitionConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VibError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            VibError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load a config file, falling back to defaults when it does not exist
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_if_exists(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Load from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        Self::load_if_exists(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VibError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        std::fs::write(path, content).map_err(|e| {
            VibError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Reject settings the acquisition core cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(VibError::Config("baud_rate must be non-zero".into()));
        }
        if self.serial.read_chunk_size == 0 {
            return Err(VibError::Config("read_chunk_size must be non-zero".into()));
        }
        if self.acquisition.history_capacity == 0 {
            return Err(VibError::Config("history_capacity must be non-zero".into()));
        }
        if self.acquisition.window_span == 0 {
            return Err(VibError::Config("window_span must be non-zero".into()));
        }
        if self.acquisition.tick_interval_ms == 0 {
            return Err(VibError::Config("tick_interval_ms must be non-zero".into()));
        }
        if self.display.y_min >= self.display.y_max {
            return Err(VibError::Config(format!(
                "y_min ({}) must be below y_max ({})",
                self.display.y_min, self.display.y_max
            )));
        }
        if self.display.min_zoom_span > self.display.max_zoom_span {
            return Err(VibError::Config(
                "min_zoom_span must not exceed max_zoom_span".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_sensor_protocol() {
        let config = AppConfig::default();
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.acquisition.history_capacity, 20_000);
        assert_eq!(config.acquisition.window_span, 2000);
        assert_eq!(config.logging.log_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [serial]
            port_name = "/dev/ttyUSB0"
            model = "LH-ST-USB"
            "#,
        )
        .unwrap();
        assert_eq!(config.serial.port_name.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.serial.model, SensorModel::LhStUsb);
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.acquisition, AcquisitionConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.serial.port_name = Some("COM3".into());
        config.acquisition.tick_interval_ms = 33;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(AppConfig::load_if_exists(&path).unwrap(), AppConfig::default());

        std::fs::write(&path, "[serial\nbaud_rate = ").unwrap();
        let err = AppConfig::load_if_exists(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.acquisition.window_span = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.display.y_min = 3.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.serial.baud_rate = 0;
        assert!(config.validate().is_err());
    }
}
