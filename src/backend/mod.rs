//! Backend module for the sensor link
//!
//! This module owns all I/O with the sensor. The acquisition loop runs as a
//! single tokio task; the blocking serial read runs beside it on the blocking
//! pool and forwards raw byte chunks over a channel.
//!
//! # Architecture
//!
//! - [`ControlCommand`] - Messages sent from the UI to the worker (start, stop, pan/zoom)
//! - [`WorkerHandle`] - UI-side handle for sending commands
//! - [`AcquisitionWorker`] - Main loop: control commands, chunks and the render tick
//! - [`spawn_reader`] - Blocking read loop with cooperative cancellation
//!
//! # Components
//!
//! - [`Transport`] - Byte link abstraction
//! - [`SerialTransport`] - Real serial port via `serialport`
//! - [`SimulatedSensor`] - In-process sensor (feature-gated)
//!
//! # Example
//!
//! ```ignore
//! use vibscope::backend::{AcquisitionWorker, SerialTransport};
//! use vibscope::sink::{LogBuffer, TracingSink};
//!
//! let transport = SerialTransport::open(&config.serial)?;
//! let (worker, handle) =
//!     AcquisitionWorker::new(config, Box::new(transport), TracingSink::default(), LogBuffer::default());
//!
//! handle.start_axis(Axis::X);
//! let report = worker.run().await?;
//! ```

pub mod serial;
#[cfg(feature = "simulated-sensor")]
pub mod simulated;
pub mod transport;
pub mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::session::Viewport;
use crate::types::Axis;

pub use serial::{list_ports, PortInfo, SerialTransport};
#[cfg(feature = "simulated-sensor")]
pub use simulated::{SimulatedSensor, SimulatedWaveform};
pub use transport::{ReadOutcome, Transport, TransportStats};
pub use worker::{AcquisitionWorker, WorkerReport};

/// Message sent from the UI to the worker
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Begin acquisition on an axis (implicitly stops the current run)
    StartAxis(Axis),
    /// Stop acquisition and freeze the view
    StopAll,
    /// Flip between live follow and analysis
    ToggleLive,
    /// Pan/zoom requested by the chart
    UserViewport(Viewport),
    /// Stop reading and close the transport
    Disconnect,
    /// Shut the worker down
    Shutdown,
}

/// Event produced by the read loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// Bytes in arrival order
    Data(Vec<u8>),
    /// The read failed; the loop has exited
    Failed(String),
    /// The peer closed the link; the loop has exited
    Closed,
}

/// UI-side handle for the worker
///
/// Sends return `false` once the worker has exited.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    command_sender: UnboundedSender<ControlCommand>,
}

impl WorkerHandle {
    pub(crate) fn new(command_sender: UnboundedSender<ControlCommand>) -> Self {
        Self { command_sender }
    }

    /// Send a command to the worker
    pub fn send_command(&self, cmd: ControlCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    /// Start acquisition on an axis
    pub fn start_axis(&self, axis: Axis) -> bool {
        self.send_command(ControlCommand::StartAxis(axis))
    }

    /// Stop acquisition
    pub fn stop_all(&self) -> bool {
        self.send_command(ControlCommand::StopAll)
    }

    /// Toggle live follow
    pub fn toggle_live(&self) -> bool {
        self.send_command(ControlCommand::ToggleLive)
    }

    /// Report a pan/zoom from the chart
    pub fn user_viewport(&self, viewport: Viewport) -> bool {
        self.send_command(ControlCommand::UserViewport(viewport))
    }

    /// Request disconnection
    pub fn disconnect(&self) -> bool {
        self.send_command(ControlCommand::Disconnect)
    }

    /// Request shutdown
    pub fn shutdown(&self) -> bool {
        self.send_command(ControlCommand::Shutdown)
    }

    /// Check whether the worker is still listening
    pub fn is_alive(&self) -> bool {
        !self.command_sender.is_closed()
    }
}

/// Run the blocking read loop on tokio's blocking pool
///
/// Chunks are forwarded in arrival order. The loop checks `cancel` between
/// reads, so exit latency is bounded by the transport's read timeout. The
/// reader is dropped on exit, releasing the read side of the link.
pub fn spawn_reader(
    mut reader: Box<dyn Transport>,
    tx: UnboundedSender<ChunkEvent>,
    cancel: Arc<AtomicBool>,
    chunk_size: usize,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut buf = vec![0u8; chunk_size.max(1)];
        while !cancel.load(Ordering::Relaxed) {
            let event = match reader.read(&mut buf) {
                Ok(ReadOutcome::Data(n)) => ChunkEvent::Data(buf[..n].to_vec()),
                Ok(ReadOutcome::Idle) => continue,
                Ok(ReadOutcome::Closed) => ChunkEvent::Closed,
                Err(e) => ChunkEvent::Failed(e.to_string()),
            };

            let done = !matches!(event, ChunkEvent::Data(_));
            if tx.send(event).is_err() || done {
                break;
            }
        }
        tracing::debug!("Read loop for {} exited", reader.name());
    })
}

/// Create the control channel pair
pub(crate) fn control_channel() -> (WorkerHandle, UnboundedReceiver<ControlCommand>) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    (WorkerHandle::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::transport::MockTransport;
    use super::*;
    use crate::error::VibError;

    #[test]
    fn test_handle_reports_closed_worker() {
        let (handle, rx) = control_channel();
        assert!(handle.start_axis(Axis::X));
        assert!(handle.is_alive());
        drop(rx);
        assert!(!handle.stop_all());
        assert!(!handle.is_alive());
    }

    #[test]
    fn test_handle_preserves_order() {
        let (handle, mut rx) = control_channel();
        handle.start_axis(Axis::Y);
        handle.toggle_live();
        handle.user_viewport(Viewport::new(10, 90));
        handle.shutdown();

        assert_eq!(rx.try_recv().ok(), Some(ControlCommand::StartAxis(Axis::Y)));
        assert_eq!(rx.try_recv().ok(), Some(ControlCommand::ToggleLive));
        assert_eq!(
            rx.try_recv().ok(),
            Some(ControlCommand::UserViewport(Viewport::new(10, 90)))
        );
        assert_eq!(rx.try_recv().ok(), Some(ControlCommand::Shutdown));
    }

    #[tokio::test]
    async fn test_reader_forwards_then_reports_failure() {
        let mut reader = MockTransport::new();
        let mut calls = 0;
        reader.expect_read().returning(move |buf| {
            calls += 1;
            match calls {
                1 => {
                    buf[..2].copy_from_slice(&[0xAB, 0xCD]);
                    Ok(ReadOutcome::Data(2))
                }
                2 => Ok(ReadOutcome::Idle),
                _ => Err(VibError::Transport("unplugged".into())),
            }
        });
        reader.expect_name().return_const("mock".to_string());

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = Arc::new(AtomicBool::new(false));
        spawn_reader(Box::new(reader), tx, cancel, 64).await.unwrap();

        assert_eq!(rx.recv().await, Some(ChunkEvent::Data(vec![0xAB, 0xCD])));
        assert!(matches!(rx.recv().await, Some(ChunkEvent::Failed(msg)) if msg.contains("unplugged")));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_reader_stops_on_cancel() {
        let mut reader = MockTransport::new();
        reader.expect_read().returning(|_| Ok(ReadOutcome::Idle));
        reader.expect_name().return_const("mock".to_string());

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let task = spawn_reader(Box::new(reader), tx, cancel.clone(), 64);
        cancel.store(true, Ordering::Relaxed);
        task.await.unwrap();
    }
}
