//! Running peak/trough tracking
//!
//! [`PeakTracker`] accumulates the extremes of every value observed since the
//! last reset. It is reset once when an acquisition run starts and never
//! during a run, so evictions from the history buffer do not affect it.
//!
//! The untouched state is explicit (`None`) rather than a pair of signed
//! infinities, so the amplitude of an empty run is never NaN or infinite.

/// Extremes observed so far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakState {
    pub max: f64,
    pub min: f64,
}

impl PeakState {
    /// Peak-to-peak distance
    #[inline]
    pub fn amplitude(&self) -> f64 {
        self.max - self.min
    }
}

/// Min/max accumulator over a single acquisition run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakTracker {
    state: Option<PeakState>,
    count: u64,
}

impl PeakTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all observations
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold a value into the extremes
    #[inline]
    pub fn observe(&mut self, value: f64) {
        self.count += 1;
        self.state = Some(match self.state {
            Some(state) => PeakState {
                max: state.max.max(value),
                min: state.min.min(value),
            },
            None => PeakState {
                max: value,
                min: value,
            },
        });
    }

    /// Current extremes, `None` before the first observation
    pub fn state(&self) -> Option<PeakState> {
        self.state
    }

    /// Peak-to-peak amplitude, `None` before the first observation
    pub fn amplitude(&self) -> Option<f64> {
        self.state.map(|s| s.amplitude())
    }

    /// Amplitude for display: 0.0 until something has been observed
    ///
    /// Check [`has_data`](Self::has_data) to tell "flat signal" apart from
    /// "no data yet".
    pub fn amplitude_or_zero(&self) -> f64 {
        self.amplitude().unwrap_or(0.0)
    }

    pub fn has_data(&self) -> bool {
        self.state.is_some()
    }

    /// Number of values observed since the last reset
    pub fn count(&self) -> u64 {
        self.count
    }
}
