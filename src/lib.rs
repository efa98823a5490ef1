//! # vibscope: LH-ST Vibration Sensor Streaming Core
//!
//! Streams single-axis acceleration from an LH-ST vibration sensor over a
//! serial link, keeps a bounded history of recent samples and drives a
//! waveform viewport that either follows the newest data or is frozen for
//! inspection.
//!
//! ## Architecture
//!
//! - **Protocol**: 4-byte frame decoder with byte-level resynchronization and
//!   the two-byte host command set
//! - **Session**: per-run state (history, peaks, viewport) behind a single
//!   owner, producing effects as events
//! - **Backend**: serial transport, blocking read loop and the tokio
//!   acquisition worker
//! - **Sinks**: where render frames and log lines go
//!
//! ## Example
//!
//! ```ignore
//! use vibscope::{
//!     backend::{AcquisitionWorker, SerialTransport},
//!     config::AppConfig,
//!     sink::{LogBuffer, TracingSink},
//!     types::Axis,
//! };
//!
//! let config = AppConfig::load_or_default();
//! let transport = SerialTransport::open(&config.serial)?;
//! let (worker, handle) = AcquisitionWorker::new(
//!     config,
//!     Box::new(transport),
//!     TracingSink::default(),
//!     LogBuffer::default(),
//! );
//!
//! handle.start_axis(Axis::X);
//! let report = runtime.block_on(worker.run())?;
//! ```

pub mod analysis;
pub mod backend;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use backend::{AcquisitionWorker, ControlCommand, SerialTransport, Transport, WorkerHandle};
pub use config::AppConfig;
pub use error::{Result, VibError};
pub use protocol::{Command, FrameDecoder};
pub use session::{AcquisitionSession, HistoryBuffer, SessionEvent, Viewport, ViewportController, ViewportMode};
pub use types::{Axis, HistoryEntry, Sample};
