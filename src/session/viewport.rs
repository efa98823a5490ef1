//! Viewport control with live and analysis modes
//!
//! Exactly one party drives the visible range at any instant:
//!
//! - **Live**: the controller follows the newest sample with a fixed window
//!   span, recomputing on every processed batch.
//! - **Analysis**: the user (pan/zoom) or a stop action owns the range; the
//!   controller never moves it until live mode is re-entered.
//!
//! Entering live mode snaps straight to the newest data. Entering analysis
//! mode freezes whatever range is given (or the current one).

use crate::types::{LIVE_VIEW_WINDOW, MAX_HISTORY_POINTS};

/// Smallest span a user zoom may produce
pub const MIN_ZOOM_SPAN: u64 = 50;

/// Largest span a user zoom may produce
pub const MAX_ZOOM_SPAN: u64 = MAX_HISTORY_POINTS as u64;

/// Who is driving the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewportMode {
    /// Follow the newest sample
    #[default]
    Live,
    /// Frozen under user control
    Analysis,
}

impl std::fmt::Display for ViewportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewportMode::Live => write!(f, "Live"),
            ViewportMode::Analysis => write!(f, "Analysis"),
        }
    }
}

/// Visible position range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub start: u64,
    pub end: u64,
}

impl Viewport {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Live-follow range: ends at `latest`, at most `window_span` wide,
    /// never starting before `earliest`
    pub fn follow(earliest: u64, latest: u64, window_span: u64) -> Self {
        Self {
            start: latest.saturating_sub(window_span).max(earliest),
            end: latest,
        }
    }
}

/// Computes the visible range and owns the live/analysis handoff
#[derive(Debug, Clone)]
pub struct ViewportController {
    mode: ViewportMode,
    current: Viewport,
    window_span: u64,
    min_zoom_span: u64,
    max_zoom_span: u64,
    /// Automatic recomputes performed while live
    recomputes: u64,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(LIVE_VIEW_WINDOW)
    }
}

impl ViewportController {
    /// Create a live controller showing `(0, window_span)`
    pub fn new(window_span: u64) -> Self {
        let window_span = window_span.max(1);
        Self {
            mode: ViewportMode::Live,
            current: Viewport::new(0, window_span),
            window_span,
            min_zoom_span: MIN_ZOOM_SPAN,
            max_zoom_span: MAX_ZOOM_SPAN,
            recomputes: 0,
        }
    }

    /// Override the span limits applied to user zoom requests
    pub fn with_zoom_limits(mut self, min_span: u64, max_span: u64) -> Self {
        self.min_zoom_span = min_span.min(max_span);
        self.max_zoom_span = max_span.max(min_span);
        self
    }

    /// What the chart should show for the given buffer bounds
    ///
    /// Live mode returns the follow range (`None` with no data); analysis
    /// mode returns the frozen range untouched.
    pub fn compute(&self, bounds: Option<(u64, u64)>) -> Option<Viewport> {
        match self.mode {
            ViewportMode::Live => {
                bounds.map(|(earliest, latest)| Viewport::follow(earliest, latest, self.window_span))
            }
            ViewportMode::Analysis => Some(self.current),
        }
    }

    /// Recompute after a batch of samples
    ///
    /// Returns the new range only when live and data exists; analysis mode
    /// never recomputes.
    pub fn follow(&mut self, bounds: Option<(u64, u64)>) -> Option<Viewport> {
        if self.mode != ViewportMode::Live {
            return None;
        }
        let viewport = self.compute(bounds)?;
        self.current = viewport;
        self.recomputes += 1;
        Some(viewport)
    }

    /// Switch to live mode, snapping to the newest data if any
    pub fn enter_live(&mut self, bounds: Option<(u64, u64)>) -> Option<Viewport> {
        self.mode = ViewportMode::Live;
        let (earliest, latest) = bounds?;
        self.current = Viewport::follow(earliest, latest, self.window_span);
        Some(self.current)
    }

    /// Switch to analysis mode, freezing `frozen` (or the current range)
    pub fn enter_analysis(&mut self, frozen: Option<Viewport>) {
        if let Some(viewport) = frozen {
            self.current = viewport;
        }
        self.mode = ViewportMode::Analysis;
    }

    /// Start-of-run state: live, showing `(0, window_span)`
    pub fn reset(&mut self) -> Viewport {
        self.mode = ViewportMode::Live;
        self.current = Viewport::new(0, self.window_span);
        self.recomputes = 0;
        self.current
    }

    /// Apply a user pan/zoom and hand control to the user
    ///
    /// The span is clamped to the zoom limits, keeping `end` unless the
    /// range has to grow past zero.
    pub fn user_adjusted(&mut self, requested: Viewport) -> Viewport {
        let (lo, hi) = if requested.start <= requested.end {
            (requested.start, requested.end)
        } else {
            (requested.end, requested.start)
        };

        let span = (hi - lo).clamp(self.min_zoom_span, self.max_zoom_span);
        let start = hi.saturating_sub(span);
        let viewport = Viewport::new(start, start + span);

        self.enter_analysis(Some(viewport));
        viewport
    }

    /// Flip between live and analysis
    ///
    /// Entering live snaps to the data; entering analysis leaves the view
    /// where it is.
    pub fn toggle(&mut self, bounds: Option<(u64, u64)>) -> Option<Viewport> {
        match self.mode {
            ViewportMode::Live => {
                self.enter_analysis(None);
                None
            }
            ViewportMode::Analysis => self.enter_live(bounds),
        }
    }

    pub fn mode(&self) -> ViewportMode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == ViewportMode::Live
    }

    pub fn current(&self) -> Viewport {
        self.current
    }

    pub fn window_span(&self) -> u64 {
        self.window_span
    }

    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }
}
