//! Scripted transport and sink helpers

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vibscope::backend::{ReadOutcome, Transport};
use vibscope::error::{Result, VibError};

#[derive(Debug, Default)]
struct Script {
    chunks: VecDeque<Vec<u8>>,
    /// Fail the next read once the queue is empty
    fail_when_drained: Option<String>,
    /// Returned on every read once the queue is empty
    flood: Option<Vec<u8>>,
    writes: Vec<Vec<u8>>,
    open: bool,
}

/// In-memory transport fed from a queue of chunks
///
/// Cloned handles share the same script, so tests keep one clone to feed
/// data and inspect writes while the worker owns another.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                open: true,
                ..Default::default()
            })),
        }
    }

    /// Queue chunks for the read loop
    pub fn push_chunks(&self, chunks: impl IntoIterator<Item = Vec<u8>>) {
        self.script.lock().unwrap().chunks.extend(chunks);
    }

    /// Make the read after the last queued chunk fail
    pub fn fail_after_drain(&self, reason: &str) {
        self.script.lock().unwrap().fail_when_drained = Some(reason.to_string());
    }

    /// Answer every read with `chunk` and never go idle
    pub fn flood_with(&self, chunk: Vec<u8>) {
        self.script.lock().unwrap().flood = Some(chunk);
    }

    /// Bytes written so far, one entry per write
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.script.lock().unwrap().writes.clone()
    }

    pub fn pending_chunks(&self) -> usize {
        self.script.lock().unwrap().chunks.len()
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        if !script.open {
            return Err(VibError::Transport("scripted transport closed".into()));
        }
        script.writes.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        {
            let mut script = self.script.lock().unwrap();
            if !script.open {
                return Ok(ReadOutcome::Closed);
            }
            if let Some(chunk) = script.chunks.pop_front() {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    script.chunks.push_front(chunk[n..].to_vec());
                }
                return Ok(ReadOutcome::Data(n));
            }
            if let Some(chunk) = &script.flood {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                return Ok(ReadOutcome::Data(n));
            }
            if let Some(reason) = script.fail_when_drained.take() {
                return Err(VibError::Transport(reason));
            }
        }
        std::thread::sleep(Duration::from_millis(1));
        Ok(ReadOutcome::Idle)
    }

    fn try_clone_reader(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(self.clone()))
    }

    fn close(&mut self) {
        self.script.lock().unwrap().open = false;
    }

    fn is_open(&self) -> bool {
        self.script.lock().unwrap().open
    }
}
