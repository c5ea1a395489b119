use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vigil_core::DataPoint;

use crate::diagnostics::Diagnostics;

use super::{PointBatcher, StorageAdapter};

/// Receive timeout while no batch is open.
const IDLE_WAIT: Duration = Duration::from_millis(250);

/// Batching parameters for the storage dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageDispatcherConfig {
    /// Capacity of the queue between workers and the dispatcher.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Flush when this many points are buffered.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Flush when the oldest buffered point is this old.
    #[serde(default = "default_max_wait_millis")]
    pub max_wait_millis: u64,
}

fn default_buffer_size() -> usize { 1000 }
fn default_max_batch_size() -> usize { 100 }
fn default_max_wait_millis() -> u64 { 1000 }

impl Default for StorageDispatcherConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            max_batch_size: default_max_batch_size(),
            max_wait_millis: default_max_wait_millis(),
        }
    }
}

/// Single aggregator thread draining the completion queue into a
/// [`StorageAdapter`] in micro-batches.
///
/// Stops once every sender is dropped, flushing what is still buffered.
pub struct StorageDispatcher<S: StorageAdapter> {
    receiver: Receiver<DataPoint>,
    adapter: S,
    batcher: PointBatcher,
    diagnostics: Arc<Diagnostics>,
}

impl<S: StorageAdapter + 'static> StorageDispatcher<S> {
    pub fn new(
        receiver: Receiver<DataPoint>,
        adapter: S,
        config: &StorageDispatcherConfig,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            receiver,
            adapter,
            batcher: PointBatcher::new(
                config.max_batch_size,
                Duration::from_millis(config.max_wait_millis),
            ),
            diagnostics,
        }
    }

    /// Run the dispatch loop on a dedicated thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("vigil-storage".into())
            .spawn(move || self.run())
    }

    /// Dispatch until the queue disconnects. Blocks the calling thread.
    pub fn run(mut self) {
        info!("Storage dispatcher started");
        loop {
            let wait = self.batcher.wait_time(Instant::now()).unwrap_or(IDLE_WAIT);
            match self.receiver.recv_timeout(wait) {
                Ok(point) => {
                    self.accept(point);
                    // take what is already queued without blocking
                    while let Ok(point) = self.receiver.try_recv() {
                        self.accept(point);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if let Some(batch) = self.batcher.take_expired(Instant::now()) {
                self.store(batch);
            }
            self.diagnostics.set_buffered(self.batcher.len());
        }

        let remaining = self.batcher.drain();
        if !remaining.is_empty() {
            self.store(remaining);
        }
        self.diagnostics.set_buffered(0);
        info!("Storage dispatcher stopped");
    }

    fn accept(&mut self, point: DataPoint) {
        if let Some(batch) = self.batcher.push(point, Instant::now()) {
            self.store(batch);
        }
    }

    fn store(&mut self, batch: Vec<DataPoint>) {
        debug!(points = batch.len(), "Flushing batch to storage");
        match self.adapter.store(&batch) {
            Ok(()) => self.diagnostics.record_stored(batch.len()),
            Err(e) => {
                self.diagnostics.mark_storage_error();
                warn!(error = %e, points = batch.len(), "Failed to store batch");
            }
        }
    }
}
