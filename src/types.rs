//! Core data types for vibscope
//!
//! This module contains the fundamental data structures shared by the
//! decoder, the history buffer and the acquisition session.
//!
//! # Main Types
//!
//! - [`Axis`] - Sensor axis selected for an acquisition run
//! - [`Sample`] - A single decoded acceleration value with its sequence number
//! - [`HistoryEntry`] - `(position, value)` pair stored for rendering
//! - [`AxisReadings`] - Latest value and amplitude per axis for the stat cards
//!
//! # Wire Constants
//!
//! The sensor streams 4-byte frames (`PACKET_SIZE`) whose 16-bit signed
//! payload is scaled by [`G_CONVERSION_FACTOR`] (0x4009 counts per g).

use serde::{Deserialize, Serialize};

/// Size of one frame on the wire in bytes
pub const PACKET_SIZE: usize = 4;

/// Raw counts per g (0x4009)
pub const G_CONVERSION_FACTOR: f64 = 16393.0;

/// Maximum number of history entries retained per acquisition run
pub const MAX_HISTORY_POINTS: usize = 20_000;

/// Width of the live-follow viewport in sample positions
pub const LIVE_VIEW_WINDOW: u64 = 2000;

/// Nominal sensor sampling interval in microseconds
pub const SAMPLING_INTERVAL_US: u64 = 500;

/// Sensor axis selected for an acquisition run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Axis {
    X,
    Y,
    Z,
    /// No axis is being acquired
    #[default]
    None,
}

impl Axis {
    /// The three measurable axes, in display order
    pub fn all() -> &'static [Axis] {
        &[Axis::X, Axis::Y, Axis::Z]
    }

    /// Returns true for X, Y and Z
    pub fn is_measurable(&self) -> bool {
        !matches!(self, Axis::None)
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
            Axis::None => write!(f, "NONE"),
        }
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            "none" => Ok(Axis::None),
            other => Err(format!("unknown axis '{}'", other)),
        }
    }
}

/// Supported sensor models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SensorModel {
    /// RS-232 variant
    #[default]
    #[serde(rename = "LH-ST-232")]
    LhSt232,
    /// USB variant
    #[serde(rename = "LH-ST-USB")]
    LhStUsb,
}

impl std::fmt::Display for SensorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorModel::LhSt232 => write!(f, "LH-ST-232"),
            SensorModel::LhStUsb => write!(f, "LH-ST-USB"),
        }
    }
}

/// A decoded acceleration sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Per-run sequence number, starting at 0
    pub sequence: u64,
    /// Acceleration in g
    pub value: f64,
    /// Axis the run was acquiring
    pub axis: Axis,
}

impl Sample {
    pub fn new(sequence: u64, value: f64, axis: Axis) -> Self {
        Self {
            sequence,
            value,
            axis,
        }
    }

    /// Convert to the pair stored by the history buffer
    #[inline]
    pub fn to_entry(&self) -> HistoryEntry {
        HistoryEntry {
            position: self.sequence,
            value: self.value,
        }
    }
}

/// `(position, value)` pair kept in arrival order for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub position: u64,
    pub value: f64,
}

impl HistoryEntry {
    pub fn new(position: u64, value: f64) -> Self {
        Self { position, value }
    }
}

/// Represents the connection status of the serial transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionStatus {
    /// No port open
    #[default]
    Disconnected,
    /// Port open and ready
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connected => write!(f, "Connected"),
        }
    }
}

/// Latest acceleration and amplitude for one axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisReading {
    /// Most recent acceleration value in g
    pub value: f64,
    /// Peak-to-peak amplitude of the most recent run in g
    pub amplitude: f64,
}

/// Per-axis readings shown on the stat cards
///
/// Readings of an axis survive runs on other axes; only the axis being
/// acquired is updated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisReadings {
    pub x: AxisReading,
    pub y: AxisReading,
    pub z: AxisReading,
}

impl AxisReadings {
    /// Get the reading for an axis (`None` for [`Axis::None`])
    pub fn get(&self, axis: Axis) -> Option<&AxisReading> {
        match axis {
            Axis::X => Some(&self.x),
            Axis::Y => Some(&self.y),
            Axis::Z => Some(&self.z),
            Axis::None => None,
        }
    }

    /// Get a mutable reading for an axis
    pub fn get_mut(&mut self, axis: Axis) -> Option<&mut AxisReading> {
        match axis {
            Axis::X => Some(&mut self.x),
            Axis::Y => Some(&mut self.y),
            Axis::Z => Some(&mut self.z),
            Axis::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_parse() {
        assert_eq!("x".parse::<Axis>(), Ok(Axis::X));
        assert_eq!(" Z ".parse::<Axis>(), Ok(Axis::Z));
        assert!("w".parse::<Axis>().is_err());
    }

    #[test]
    fn test_axis_display() {
        assert_eq!(Axis::Y.to_string(), "Y");
        assert_eq!(Axis::None.to_string(), "NONE");
        assert!(!Axis::None.is_measurable());
        assert_eq!(Axis::all().len(), 3);
    }

    #[test]
    fn test_sample_to_entry() {
        let sample = Sample::new(42, 0.25, Axis::X);
        let entry = sample.to_entry();
        assert_eq!(entry.position, 42);
        assert_eq!(entry.value, 0.25);
    }

    #[test]
    fn test_axis_readings_lookup() {
        let mut readings = AxisReadings::default();
        readings.get_mut(Axis::Y).unwrap().amplitude = 1.5;
        assert_eq!(readings.y.amplitude, 1.5);
        assert!(readings.get(Axis::None).is_none());
        assert!(readings.get_mut(Axis::None).is_none());
    }

    #[test]
    fn test_sensor_model_serde_names() {
        let json = serde_json::to_string(&SensorModel::LhStUsb).unwrap();
        assert_eq!(json, "\"LH-ST-USB\"");
        assert_eq!(SensorModel::LhSt232.to_string(), "LH-ST-232");
    }
}
