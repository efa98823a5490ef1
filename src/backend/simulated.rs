//! Simulated sensor for running without hardware
//!
//! Behaves like an LH-ST sensor on the byte level: it parses the same
//! two-byte commands and, while an axis is active, produces 4-byte frames
//! at the sensor's nominal 2 kHz rate.
//!
//! # Waveforms
//!
//! - [`SimulatedWaveform::Sine`] - Sinusoid, frequency and amplitude in g
//! - [`SimulatedWaveform::Constant`] - Fixed value (useful for deterministic checks)
//!
//! # Enabling
//!
//! Only available when the `simulated-sensor` feature is enabled:
//!
//! ```bash
//! cargo run --features simulated-sensor -- --simulate --axis x
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{Result, VibError};
use crate::protocol::{encode_frame, Command};
use crate::types::{Axis, PACKET_SIZE, SAMPLING_INTERVAL_US};

use super::transport::{ReadOutcome, Transport};

/// Signal produced by the simulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulatedWaveform {
    Constant(f64),
    Sine { frequency: f64, amplitude: f64 },
}

impl Default for SimulatedWaveform {
    fn default() -> Self {
        SimulatedWaveform::Sine {
            frequency: 25.0,
            amplitude: 0.8,
        }
    }
}

impl SimulatedWaveform {
    fn sample(&self, index: u64, axis: Axis) -> f64 {
        match *self {
            SimulatedWaveform::Constant(value) => value,
            SimulatedWaveform::Sine {
                frequency,
                amplitude,
            } => {
                // Give each axis its own phase so switching axes is visible.
                let phase = match axis {
                    Axis::Y => std::f64::consts::FRAC_PI_2,
                    Axis::Z => std::f64::consts::PI,
                    _ => 0.0,
                };
                let t = index as f64 * SAMPLING_INTERVAL_US as f64 / 1_000_000.0;
                amplitude * (std::f64::consts::TAU * frequency * t + phase).sin()
            }
        }
    }
}

#[derive(Debug)]
struct SimState {
    axis: Axis,
    waveform: SimulatedWaveform,
    /// Frames emitted since the current axis started
    emitted: u64,
    started: Instant,
    open: bool,
    commands: Vec<Command>,
}

/// Sensor simulator implementing [`Transport`]
///
/// Clones made with `try_clone_reader` share state with the original, like
/// two handles on one serial port.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    state: Arc<Mutex<SimState>>,
    poll_interval: Duration,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new(SimulatedWaveform::default())
    }
}

impl SimulatedSensor {
    pub fn new(waveform: SimulatedWaveform) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                axis: Axis::None,
                waveform,
                emitted: 0,
                started: Instant::now(),
                open: true,
                commands: Vec::new(),
            })),
            poll_interval: Duration::from_millis(5),
        }
    }

    /// How long an idle read blocks before returning
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Axis currently streaming, [`Axis::None`] when stopped
    pub fn streaming_axis(&self) -> Axis {
        self.lock().map(|s| s.axis).unwrap_or(Axis::None)
    }

    /// Commands received so far, in order
    pub fn received_commands(&self) -> Vec<Command> {
        self.lock().map(|s| s.commands.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, SimState>> {
        self.state
            .lock()
            .map_err(|_| VibError::Transport("Simulator state poisoned".to_string()))
    }
}

impl Transport for SimulatedSensor {
    fn name(&self) -> String {
        "simulated".to_string()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock()?;
        if !state.open {
            return Err(VibError::Transport("Simulated sensor is closed".to_string()));
        }

        let command = <[u8; 2]>::try_from(bytes)
            .ok()
            .and_then(Command::from_bytes)
            .ok_or_else(|| VibError::Transport(format!("Unknown command bytes {:02X?}", bytes)))?;
        match command {
            Command::Start(axis) => {
                state.axis = axis;
                state.emitted = 0;
                state.started = Instant::now();
            }
            Command::Stop => state.axis = Axis::None,
        }
        state.commands.push(command);
        tracing::trace!("Simulator received {}", command);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let ready = {
            let mut state = self.lock()?;
            if !state.open {
                return Ok(ReadOutcome::Closed);
            }
            if state.axis.is_measurable() {
                let elapsed_us = state.started.elapsed().as_micros() as u64;
                let due = (elapsed_us / SAMPLING_INTERVAL_US).saturating_sub(state.emitted);
                let count = (due as usize).min(buf.len() / PACKET_SIZE);

                let (axis, waveform, first) = (state.axis, state.waveform, state.emitted);
                for (i, slot) in buf.chunks_exact_mut(PACKET_SIZE).take(count).enumerate() {
                    slot.copy_from_slice(&encode_frame(waveform.sample(first + i as u64, axis)));
                }
                state.emitted += count as u64;
                count * PACKET_SIZE
            } else {
                0
            }
        };

        if ready > 0 {
            Ok(ReadOutcome::Data(ready))
        } else {
            std::thread::sleep(self.poll_interval);
            Ok(ReadOutcome::Idle)
        }
    }

    fn try_clone_reader(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(self.clone()))
    }

    fn close(&mut self) {
        if let Ok(mut state) = self.lock() {
            state.open = false;
            state.axis = Axis::None;
        }
    }

    fn is_open(&self) -> bool {
        self.lock().map(|s| s.open).unwrap_or(false)
    }
}
