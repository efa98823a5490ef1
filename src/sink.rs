//! Output sinks for the acquisition core
//!
//! The core never draws or prints anything itself. Render frames and viewport
//! moves go to a [`RenderSink`]; user-facing diagnostics go to a [`LogSink`].
//!
//! - [`LogBuffer`] keeps the newest log lines for a log panel
//! - [`ChannelSink`] forwards everything to a UI thread over a bounded channel
//! - [`TracingSink`] reports frames through `tracing` (headless runs)

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::Serialize;

use crate::config::DEFAULT_LOG_CAPACITY;
use crate::session::{RenderUpdate, Viewport, ViewportMode};

/// Consumer of waveform frames and viewport moves
pub trait RenderSink {
    /// Redraw with a new history snapshot (and viewport, when live)
    fn render(&mut self, update: &RenderUpdate);

    /// Move the visible range
    fn set_viewport(&mut self, viewport: Viewport, mode: ViewportMode);

    /// Fix the vertical axis to `min..max` g
    fn set_y_range(&mut self, min: f64, max: f64);
}

/// Consumer of user-facing log lines
pub trait LogSink {
    fn log(&mut self, message: &str);
}

impl<T: RenderSink + ?Sized> RenderSink for &mut T {
    fn render(&mut self, update: &RenderUpdate) {
        (**self).render(update)
    }

    fn set_viewport(&mut self, viewport: Viewport, mode: ViewportMode) {
        (**self).set_viewport(viewport, mode)
    }

    fn set_y_range(&mut self, min: f64, max: f64) {
        (**self).set_y_range(min, max)
    }
}

impl<T: LogSink + ?Sized> LogSink for &mut T {
    fn log(&mut self, message: &str) {
        (**self).log(message)
    }
}

/// A timestamped log line
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S%.3f"), self.message)
    }
}

/// Newest-first log ring
///
/// Every line is also mirrored to `tracing` at info level.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Messages, newest first
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl LogSink for LogBuffer {
    fn log(&mut self, message: &str) {
        tracing::info!(target: "vibscope::log", "{}", message);
        self.entries.push_front(LogEntry {
            timestamp: Local::now(),
            message: message.to_string(),
        });
        self.entries.truncate(self.capacity);
    }
}

/// Messages delivered by [`ChannelSink`]
#[derive(Debug, Clone)]
pub enum SinkMessage {
    Frame(RenderUpdate),
    Viewport { viewport: Viewport, mode: ViewportMode },
    YRange { min: f64, max: f64 },
    Log(String),
}

/// Forwards frames, viewport moves and log lines to another thread
///
/// Uses `try_send`; when the receiver falls behind, messages are counted as
/// dropped instead of blocking the acquisition loop.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<SinkMessage>,
    dropped: u64,
}

impl ChannelSink {
    /// Create a sink and the receiver for the UI side
    pub fn bounded(capacity: usize) -> (Self, Receiver<SinkMessage>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (Self { tx, dropped: 0 }, rx)
    }

    /// Messages dropped due to backpressure
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn send(&mut self, message: SinkMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped.is_power_of_two() {
                    tracing::warn!("ChannelSink dropped {} messages due to backpressure", self.dropped);
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
            }
        }
    }
}

impl RenderSink for ChannelSink {
    fn render(&mut self, update: &RenderUpdate) {
        self.send(SinkMessage::Frame(update.clone()));
    }

    fn set_viewport(&mut self, viewport: Viewport, mode: ViewportMode) {
        self.send(SinkMessage::Viewport { viewport, mode });
    }

    fn set_y_range(&mut self, min: f64, max: f64) {
        self.send(SinkMessage::YRange { min, max });
    }
}

impl LogSink for ChannelSink {
    fn log(&mut self, message: &str) {
        self.send(SinkMessage::Log(message.to_string()));
    }
}

/// Headless sink that reports frames through `tracing`
#[derive(Debug, Default)]
pub struct TracingSink {
    frames: u64,
    last_viewport: Option<Viewport>,
    y_range: Option<(f64, f64)>,
}

impl TracingSink {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }

    pub fn y_range(&self) -> Option<(f64, f64)> {
        self.y_range
    }
}

impl RenderSink for TracingSink {
    fn render(&mut self, update: &RenderUpdate) {
        self.frames += 1;
        if let Some(viewport) = update.viewport {
            self.last_viewport = Some(viewport);
        }
        tracing::trace!(
            "Frame {}: {} points on {} axis, viewport {:?}",
            self.frames,
            update.snapshot.len(),
            update.axis,
            update.viewport
        );
    }

    fn set_viewport(&mut self, viewport: Viewport, mode: ViewportMode) {
        self.last_viewport = Some(viewport);
        tracing::debug!("Viewport {}..{} ({})", viewport.start, viewport.end, mode);
    }

    fn set_y_range(&mut self, min: f64, max: f64) {
        self.y_range = Some((min, max));
        tracing::debug!("Y axis fixed to {}..{} g", min, max);
    }
}
