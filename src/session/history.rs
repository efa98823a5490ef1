//! Bounded sample history
//!
//! [`HistoryBuffer`] keeps the most recent entries of an acquisition run in
//! arrival order. Once the capacity is exceeded the oldest entries are
//! evicted first, so the buffer always holds the newest `capacity` positions.

use std::collections::VecDeque;

use crate::types::{HistoryEntry, MAX_HISTORY_POINTS};

use super::viewport::Viewport;

/// Fixed-capacity FIFO of `(position, value)` pairs
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    /// Entries evicted since the last clear
    evicted: u64,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    /// Create a buffer holding [`MAX_HISTORY_POINTS`] entries
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_POINTS)
    }

    /// Create a buffer with a custom capacity (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append entries in order, then evict from the front down to capacity
    ///
    /// Positions must be strictly increasing across appends; the session's
    /// sequence counter guarantees this.
    pub fn append<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = HistoryEntry>,
    {
        for entry in entries {
            debug_assert!(
                self.entries
                    .back()
                    .map_or(true, |last| last.position < entry.position),
                "history positions must be strictly increasing"
            );
            self.entries.push_back(entry);
        }

        let excess = self.entries.len().saturating_sub(self.capacity);
        if excess > 0 {
            self.entries.drain(..excess);
            self.evicted += excess as u64;
        }
    }

    /// `(earliest, latest)` positions, `None` when empty
    pub fn bounds(&self) -> Option<(u64, u64)> {
        match (self.entries.front(), self.entries.back()) {
            (Some(first), Some(last)) => Some((first.position, last.position)),
            _ => None,
        }
    }

    /// Copy of every entry in position order
    ///
    /// The copy is detached from the buffer, so later appends do not change it.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    /// Entries whose position falls inside the viewport (inclusive)
    pub fn visible(&self, viewport: Viewport) -> impl Iterator<Item = &HistoryEntry> {
        let start = self.entries.partition_point(|e| e.position < viewport.start);
        let end = self.entries.partition_point(|e| e.position <= viewport.end);
        self.entries.range(start..end.max(start))
    }

    /// Newest entry
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.evicted = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries evicted since the last clear
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}
