//! Transport trait for the sensor link
//!
//! This module provides a common trait for byte transports, enabling both the
//! real serial port and simulated sensors for testing. The acquisition core
//! only needs ordered, duplicate-free delivery; retry and reconnect are left
//! to the user.

use crate::error::Result;

/// Outcome of a single read attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written to the front of the buffer
    Data(usize),
    /// The read timed out with nothing available
    Idle,
    /// The peer closed the stream
    Closed,
}

/// Counters for transport activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TransportStats {
    /// Total bytes received
    pub bytes_read: u64,
    /// Number of non-empty chunks received
    pub chunks_read: u64,
    /// Total bytes written
    pub bytes_written: u64,
    /// Number of commands successfully written
    pub commands_written: u64,
    /// Number of failed writes
    pub failed_writes: u64,
    /// Number of failed reads
    pub failed_reads: u64,
}

impl TransportStats {
    /// Record a received chunk
    pub fn record_read(&mut self, bytes: usize) {
        self.bytes_read += bytes as u64;
        self.chunks_read += 1;
    }

    /// Record a successful command write
    pub fn record_write(&mut self, bytes: usize) {
        self.bytes_written += bytes as u64;
        self.commands_written += 1;
    }

    /// Record a failed write
    pub fn record_write_failure(&mut self) {
        self.failed_writes += 1;
    }

    /// Record a failed read
    pub fn record_read_failure(&mut self) {
        self.failed_reads += 1;
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Unified interface for sensor links
///
/// Implementations must be `Send`: the read side is moved onto a blocking
/// thread while the write side stays with the acquisition loop.
///
/// # Example
///
/// ```ignore
/// fn send_stop(link: &mut dyn Transport) -> Result<()> {
///     link.write(&Command::Stop.to_bytes())
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Human-readable name (port path or simulator name)
    fn name(&self) -> String;

    /// Write all bytes or fail
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read whatever is available into `buf`
    ///
    /// Must return within a bounded time (a timeout yields
    /// [`ReadOutcome::Idle`]) so a cancelled read loop can exit.
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome>;

    /// Independent handle sharing the same link, used for the read loop
    fn try_clone_reader(&self) -> Result<Box<dyn Transport>>;

    /// Close the link; later I/O fails
    fn close(&mut self);

    /// Check whether the link is open
    fn is_open(&self) -> bool;
}
