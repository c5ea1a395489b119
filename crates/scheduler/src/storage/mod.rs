//! Storage side of the pipeline: adapters and the buffered dispatcher.

mod batcher;
mod dispatcher;

use tracing::info;
use vigil_core::{DataPoint, Sample};

use crate::error::StorageError;

pub use batcher::PointBatcher;
pub use dispatcher::{StorageDispatcher, StorageDispatcherConfig};

/// Destination for collected data points.
pub trait StorageAdapter: Send {
    fn store(&mut self, points: &[DataPoint]) -> Result<(), StorageError>;
}

/// Writes every data point to the log.
#[derive(Debug, Default)]
pub struct LogStorage;

impl StorageAdapter for LogStorage {
    fn store(&mut self, points: &[DataPoint]) -> Result<(), StorageError> {
        for point in points {
            let key = point.key();
            match point.sample {
                Sample::Metric(value) => {
                    info!(key = %key, value, timestamp = %point.timestamp, "metric");
                }
                Sample::Avail(avail) => {
                    info!(key = %key, avail = %avail, timestamp = %point.timestamp, "avail");
                }
            }
        }
        Ok(())
    }
}
