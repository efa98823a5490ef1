//! Acquisition worker
//!
//! The worker owns the [`AcquisitionSession`] and the write side of the
//! transport, and runs one `tokio::select!` loop over three sources:
//!
//! - **Control commands** from the UI ([`ControlCommand`])
//! - **The render tick**, which drains pending samples into history
//! - **Byte chunks** from the blocking read loop ([`ChunkEvent`])
//!
//! Sources are polled in that order.
//!
//! Session state is only ever touched from this loop, so it needs no locks.
//! After every step the session's queued effects are dispatched: commands
//! are written to the sensor, viewport moves and frames go to the
//! [`RenderSink`], log lines go to the [`LogSink`].
//!
//! # Failures
//!
//! A failed command write is logged and counted; the session has already
//! moved on and is not rolled back. A failed read ends the read loop and
//! marks the link disconnected; history and decoder state are left as they
//! were so the last run can still be inspected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::AppConfig;
use crate::error::Result;
use crate::protocol::{Command, DecodeStats};
use crate::session::{AcquisitionSession, SessionConfig, SessionEvent};
use crate::sink::{LogSink, RenderSink};
use crate::types::{AxisReadings, ConnectionStatus};

use super::transport::{Transport, TransportStats};
use super::{control_channel, spawn_reader, ChunkEvent, ControlCommand, WorkerHandle};

/// Summary returned when the worker exits
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub transport: String,
    pub status: ConnectionStatus,
    pub readings: AxisReadings,
    pub transport_stats: TransportStats,
    pub decode_stats: DecodeStats,
    pub history_len: usize,
    pub viewport_mode: String,
    pub viewport: (u64, u64),
}

/// Main acquisition loop
pub struct AcquisitionWorker<R: RenderSink, L: LogSink> {
    config: AppConfig,
    session: AcquisitionSession,
    transport: Box<dyn Transport>,
    render: R,
    log: L,
    control_rx: UnboundedReceiver<ControlCommand>,
    status: ConnectionStatus,
    stats: TransportStats,
}

impl<R: RenderSink, L: LogSink> AcquisitionWorker<R, L> {
    /// Create a worker and the handle used to control it
    pub fn new(
        config: AppConfig,
        transport: Box<dyn Transport>,
        render: R,
        log: L,
    ) -> (Self, WorkerHandle) {
        let (handle, control_rx) = control_channel();
        let session = AcquisitionSession::new(SessionConfig::from(&config));

        let worker = Self {
            config,
            session,
            transport,
            render,
            log,
            control_rx,
            status: ConnectionStatus::Disconnected,
            stats: TransportStats::default(),
        };
        (worker, handle)
    }

    /// Run until [`ControlCommand::Disconnect`], [`ControlCommand::Shutdown`]
    /// or until every [`WorkerHandle`] is dropped
    pub async fn run(mut self) -> Result<WorkerReport> {
        let reader = self.transport.try_clone_reader()?;
        let cancel = Arc::new(AtomicBool::new(false));
        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
        let mut reader_task = Some(spawn_reader(
            reader,
            chunk_tx,
            cancel.clone(),
            self.config.serial.read_chunk_size,
        ));

        self.status = ConnectionStatus::Connected;
        self.log.log(&format!(
            "Connected to {} ({})",
            self.transport.name(),
            self.config.serial.model
        ));
        self.render
            .set_y_range(self.config.display.y_min, self.config.display.y_max);

        let mut ticker = tokio::time::interval(self.config.acquisition.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                cmd = self.control_rx.recv() => match cmd {
                    Some(ControlCommand::Disconnect) => {
                        self.log.log("Disconnect requested");
                        break;
                    }
                    Some(ControlCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },

                // The tick is polled ahead of chunks so a saturated link
                // cannot starve rendering.
                _ = ticker.tick() => {
                    self.session.tick();
                }

                chunk = chunk_rx.recv(), if reader_task.is_some() => match chunk {
                    Some(ChunkEvent::Data(bytes)) => {
                        self.stats.record_read(bytes.len());
                        self.session.ingest(&bytes);
                    }
                    Some(ChunkEvent::Failed(reason)) => {
                        self.stats.record_read_failure();
                        self.connection_lost(&format!("Read failed: {}", reason), &mut reader_task)
                            .await;
                    }
                    Some(ChunkEvent::Closed) | None => {
                        self.connection_lost("Sensor closed the connection", &mut reader_task)
                            .await;
                    }
                },

            }

            self.dispatch_events();
        }

        self.teardown(&cancel, reader_task).await;
        Ok(self.report())
    }

    fn handle_command(&mut self, cmd: ControlCommand) {
        tracing::debug!("Control command: {:?}", cmd);
        match cmd {
            ControlCommand::StartAxis(axis) => self.session.start_axis(axis),
            ControlCommand::StopAll => self.session.stop_all(),
            ControlCommand::ToggleLive => self.session.toggle_live(),
            ControlCommand::UserViewport(requested) => {
                self.session.user_viewport(requested);
            }
            ControlCommand::Disconnect | ControlCommand::Shutdown => {}
        }
    }

    /// Deliver queued session effects in emission order
    fn dispatch_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::Command(command) => self.write_command(command),
                SessionEvent::Viewport { viewport, mode } => {
                    self.render.set_viewport(viewport, mode)
                }
                SessionEvent::Render(update) => self.render.render(&update),
                SessionEvent::Log(message) => self.log.log(&message),
            }
        }
    }

    fn write_command(&mut self, command: Command) {
        if self.status != ConnectionStatus::Connected {
            self.log.log(&format!("Not connected, {} not sent", command));
            return;
        }

        let bytes = command.to_bytes();
        match self.transport.write(&bytes) {
            Ok(()) => {
                self.stats.record_write(bytes.len());
                tracing::debug!("Sent {} ({:02X?})", command, bytes);
            }
            Err(e) => {
                self.stats.record_write_failure();
                tracing::warn!("Failed to send {}: {}", command, e);
                self.log.log(&format!("Failed to send {}: {}", command, e));
            }
        }
    }

    async fn connection_lost(&mut self, reason: &str, reader_task: &mut Option<JoinHandle<()>>) {
        tracing::warn!("{}", reason);
        if let Some(task) = reader_task.take() {
            if let Err(e) = task.await {
                tracing::error!("Read loop panicked: {}", e);
            }
        }
        self.session.transport_lost();
        self.status = ConnectionStatus::Disconnected;
        self.log.log(reason);
    }

    async fn teardown(&mut self, cancel: &AtomicBool, reader_task: Option<JoinHandle<()>>) {
        if self.session.is_running() {
            self.session.stop_all();
            self.dispatch_events();
        }

        cancel.store(true, Ordering::Relaxed);
        if let Some(task) = reader_task {
            if let Err(e) = task.await {
                tracing::error!("Read loop panicked: {}", e);
            }
        }

        self.transport.close();
        self.status = ConnectionStatus::Disconnected;
        self.log.log(&format!("Disconnected from {}", self.transport.name()));
    }

    fn report(&self) -> WorkerReport {
        let viewport = self.session.viewport().current();
        WorkerReport {
            transport: self.transport.name(),
            status: self.status,
            readings: *self.session.readings(),
            transport_stats: self.stats,
            decode_stats: self.session.decode_stats(),
            history_len: self.session.history().len(),
            viewport_mode: self.session.viewport().mode().to_string(),
            viewport: (viewport.start, viewport.end),
        }
    }

    pub fn session(&self) -> &AcquisitionSession {
        &self.session
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn stats(&self) -> TransportStats {
        self.stats
    }
}
