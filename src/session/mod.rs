//! Acquisition session
//!
//! [`AcquisitionSession`] owns all per-run state (decoder carry, pending
//! samples, history, peak tracker, sequence counter, viewport) and drives it
//! through the run lifecycle:
//!
//! ```text
//! Idle --start_axis(X)--> Running(X) --start_axis(Y)--> Running(Y) --stop_all--> Idle
//! ```
//!
//! The session performs no I/O. Every effect that must leave the core (sensor
//! commands, viewport changes, render frames, user-facing log lines) is queued
//! as a [`SessionEvent`] and collected with [`AcquisitionSession::drain_events`].
//!
//! # Ingest and tick
//!
//! Byte chunks go through [`ingest`](AcquisitionSession::ingest), which decodes
//! them and queues numbered samples. [`tick`](AcquisitionSession::tick) drains
//! that queue in order into the history buffer and peak tracker and, in live
//! mode, recomputes the viewport once per batch.

pub mod history;
pub mod viewport;

use std::collections::VecDeque;

use crate::analysis::PeakTracker;
use crate::config::AppConfig;
use crate::protocol::{Command, DecodeStats, DecoderState, FrameDecoder};
use crate::types::{Axis, AxisReadings, HistoryEntry, Sample, LIVE_VIEW_WINDOW, MAX_HISTORY_POINTS};

pub use history::HistoryBuffer;
pub use viewport::{Viewport, ViewportController, ViewportMode, MAX_ZOOM_SPAN, MIN_ZOOM_SPAN};

/// Run state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running(Axis),
}

impl SessionState {
    /// Axis being acquired, [`Axis::None`] when idle
    pub fn axis(&self) -> Axis {
        match self {
            SessionState::Idle => Axis::None,
            SessionState::Running(axis) => *axis,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running(_))
    }
}

/// Frame pushed to the rendering sink
#[derive(Debug, Clone, PartialEq)]
pub struct RenderUpdate {
    /// Full history in position order
    pub snapshot: Vec<HistoryEntry>,
    /// New visible range; `None` when the viewport is user-controlled
    pub viewport: Option<Viewport>,
    /// Axis the samples belong to
    pub axis: Axis,
    /// Stat card values after this batch
    pub readings: AxisReadings,
}

/// Effects produced by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Write a command to the sensor
    Command(Command),
    /// Move the chart viewport
    Viewport { viewport: Viewport, mode: ViewportMode },
    /// Redraw the waveform
    Render(RenderUpdate),
    /// User-facing log line
    Log(String),
}

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub history_capacity: usize,
    pub window_span: u64,
    pub min_zoom_span: u64,
    pub max_zoom_span: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: MAX_HISTORY_POINTS,
            window_span: LIVE_VIEW_WINDOW,
            min_zoom_span: MIN_ZOOM_SPAN,
            max_zoom_span: MAX_ZOOM_SPAN,
        }
    }
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            history_capacity: config.acquisition.history_capacity,
            window_span: config.acquisition.window_span,
            min_zoom_span: config.display.min_zoom_span,
            max_zoom_span: config.display.max_zoom_span,
        }
    }
}

/// Composition root of the acquisition core
#[derive(Debug)]
pub struct AcquisitionSession {
    state: SessionState,
    decoder: FrameDecoder,
    /// Decoded samples waiting for the next tick
    pending: VecDeque<Sample>,
    history: HistoryBuffer,
    peaks: PeakTracker,
    viewport: ViewportController,
    next_sequence: u64,
    readings: AxisReadings,
    events: Vec<SessionEvent>,
}

impl Default for AcquisitionSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl AcquisitionSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: SessionState::Idle,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            history: HistoryBuffer::with_capacity(config.history_capacity),
            peaks: PeakTracker::new(),
            viewport: ViewportController::new(config.window_span)
                .with_zoom_limits(config.min_zoom_span, config.max_zoom_span),
            next_sequence: 0,
            readings: AxisReadings::default(),
            events: Vec::new(),
        }
    }

    /// Begin a run on `axis`, implicitly stopping any current run
    ///
    /// Per-run state is reset here and only here.
    pub fn start_axis(&mut self, axis: Axis) {
        if !axis.is_measurable() {
            tracing::warn!("Ignoring start request without an axis");
            return;
        }

        self.events.push(SessionEvent::Command(Command::Stop));

        self.decoder.reset();
        self.pending.clear();
        self.history.clear();
        self.peaks.reset();
        self.next_sequence = 0;

        let viewport = self.viewport.reset();
        self.events.push(SessionEvent::Viewport {
            viewport,
            mode: ViewportMode::Live,
        });

        self.state = SessionState::Running(axis);
        self.events.push(SessionEvent::Command(Command::Start(axis)));
        self.events
            .push(SessionEvent::Log(format!("Started acquisition on {} axis", axis)));
        tracing::debug!("Session running on axis {}", axis);
    }

    /// Decode a chunk and queue its samples for the next tick
    ///
    /// Bytes are always decoded so the carry stays aligned, but values are
    /// only kept while a run is active. Returns the number of samples queued.
    pub fn ingest(&mut self, chunk: &[u8]) -> usize {
        let values = self.decoder.feed(chunk);
        let SessionState::Running(axis) = self.state else {
            if !values.is_empty() {
                tracing::trace!("Discarding {} value(s) received while idle", values.len());
            }
            return 0;
        };

        let queued = values.len();
        for value in values {
            self.pending
                .push_back(Sample::new(self.next_sequence, value, axis));
            self.next_sequence += 1;
        }
        queued
    }

    /// Apply queued samples and emit a render frame
    ///
    /// Returns false when nothing was pending.
    pub fn tick(&mut self) -> bool {
        self.apply_pending(true)
    }

    /// Stop the run and freeze the view on the newest data
    pub fn stop_all(&mut self) {
        self.events.push(SessionEvent::Command(Command::Stop));

        // Samples decoded before the stop still belong to the run.
        self.apply_pending(false);

        let frozen = self
            .history
            .bounds()
            .map(|(earliest, latest)| Viewport::follow(earliest, latest, self.viewport.window_span()));
        self.viewport.enter_analysis(frozen);
        if let Some(viewport) = frozen {
            self.events.push(SessionEvent::Viewport {
                viewport,
                mode: ViewportMode::Analysis,
            });
        }

        self.state = SessionState::Idle;
        self.events.push(SessionEvent::Log(
            "Acquisition stopped: view frozen at the newest data, pan and zoom enabled".into(),
        ));
    }

    /// Flip between live follow and analysis
    pub fn toggle_live(&mut self) {
        let snapped = self.viewport.toggle(self.history.bounds());
        if let Some(viewport) = snapped {
            self.events.push(SessionEvent::Viewport {
                viewport,
                mode: ViewportMode::Live,
            });
        }

        let message = if self.viewport.is_live() {
            "Live follow resumed"
        } else {
            "Analysis mode: viewport released for manual inspection"
        };
        self.events.push(SessionEvent::Log(message.into()));
    }

    /// Handle a pan/zoom coming from the chart
    pub fn user_viewport(&mut self, requested: Viewport) -> Viewport {
        let was_live = self.viewport.is_live();
        let viewport = self.viewport.user_adjusted(requested);
        if was_live {
            tracing::debug!("User gesture switched viewport to analysis mode");
        }
        self.events.push(SessionEvent::Viewport {
            viewport,
            mode: ViewportMode::Analysis,
        });
        viewport
    }

    /// The transport went away; end the run without touching its data
    pub fn transport_lost(&mut self) {
        if self.state.is_running() {
            self.apply_pending(false);
            self.state = SessionState::Idle;
        }
    }

    /// Take all queued effects in emission order
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn apply_pending(&mut self, follow: bool) -> bool {
        if self.pending.is_empty() {
            return false;
        }

        let batch: Vec<Sample> = self.pending.drain(..).collect();
        for sample in &batch {
            self.peaks.observe(sample.value);
        }
        self.history.append(batch.iter().map(Sample::to_entry));

        // The batch is non-empty, so `last` exists.
        let last = batch[batch.len() - 1];
        if let Some(reading) = self.readings.get_mut(last.axis) {
            reading.value = last.value;
            if let Some(amplitude) = self.peaks.amplitude() {
                reading.amplitude = amplitude;
            }
        }

        let viewport = if follow {
            self.viewport.follow(self.history.bounds())
        } else {
            None
        };

        self.events.push(SessionEvent::Render(RenderUpdate {
            snapshot: self.history.snapshot(),
            viewport,
            axis: last.axis,
            readings: self.readings,
        }));
        true
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_axis(&self) -> Axis {
        self.state.axis()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn peaks(&self) -> &PeakTracker {
        &self.peaks
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn readings(&self) -> &AxisReadings {
        &self.readings
    }

    pub fn decode_stats(&self) -> DecodeStats {
        self.decoder.stats()
    }

    /// Bytes held back for the next chunk
    pub fn decoder_state(&self) -> &DecoderState {
        self.decoder.state()
    }

    /// Samples decoded but not yet applied
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Sequence number the next sample will get
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}
