//! Sinks for batch outcomes.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};

use tracing::warn;
use vigil_core::{DataPoint, Sample};

use crate::diagnostics::Diagnostics;
use crate::error::PollError;

/// Receives every outcome a batch runnable produces. No retry logic lives
/// here; a handler only records or forwards.
pub trait CompletionHandler: Send + Sync {
    fn on_completed(&self, point: DataPoint);

    fn on_failed(&self, error: &PollError);
}

/// Forwards data points to the storage dispatcher over a bounded channel.
///
/// Never blocks a worker: when the queue is full the point is dropped with
/// a warning and counted in diagnostics.
pub struct ChannelCompletionHandler {
    sender: SyncSender<DataPoint>,
    diagnostics: Arc<Diagnostics>,
}

impl ChannelCompletionHandler {
    /// Create a handler and the receiving end of its queue.
    pub fn bounded(capacity: usize, diagnostics: Arc<Diagnostics>) -> (Self, Receiver<DataPoint>) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        (Self { sender, diagnostics }, receiver)
    }
}

impl CompletionHandler for ChannelCompletionHandler {
    fn on_completed(&self, point: DataPoint) {
        match point.sample {
            Sample::Metric(_) => self.diagnostics.mark_metric(),
            Sample::Avail(_) => self.diagnostics.mark_avail(),
        }
        match self.sender.try_send(point) {
            Ok(()) => self.diagnostics.mark_queued(),
            Err(TrySendError::Full(point)) => {
                self.diagnostics.mark_dropped();
                warn!(task = %point.task.id(), "Storage queue full, dropping data point");
            }
            Err(TrySendError::Disconnected(point)) => {
                self.diagnostics.mark_dropped();
                warn!(task = %point.task.id(), "Storage queue closed, dropping data point");
            }
        }
    }

    fn on_failed(&self, error: &PollError) {
        warn!(error = %error, "Collection failed");
    }
}

/// Keeps every outcome in memory. Useful for embedding and tests.
#[derive(Default)]
pub struct CollectingHandler {
    points: Mutex<Vec<DataPoint>>,
    failures: Mutex<Vec<PollError>>,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> Vec<DataPoint> {
        self.points.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn failures(&self) -> Vec<PollError> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl CompletionHandler for CollectingHandler {
    fn on_completed(&self, point: DataPoint) {
        if let Ok(mut points) = self.points.lock() {
            points.push(point);
        }
    }

    fn on_failed(&self, error: &PollError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(error.clone());
        }
    }
}
