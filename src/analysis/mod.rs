//! Analysis module for acquisition statistics
//!
//! This module provides running statistics computed while samples arrive:
//! - Peak/trough tracking over one acquisition run
//! - Peak-to-peak amplitude

pub mod peak;

pub use peak::{PeakState, PeakTracker};
