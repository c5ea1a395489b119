use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::key::StorageKey;
use crate::task::{Avail, Task};

/// Sampled value of a [`DataPoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Metric(f64),
    Avail(Avail),
}

/// One outcome for one task at one point in time.
#[derive(Debug, Clone)]
pub struct DataPoint {
    pub task: Arc<Task>,
    pub sample: Sample,
    pub timestamp: DateTime<Utc>,
}

impl DataPoint {
    pub fn metric(task: Arc<Task>, value: f64) -> Self {
        Self {
            task,
            sample: Sample::Metric(value),
            timestamp: Utc::now(),
        }
    }

    pub fn avail(task: Arc<Task>, avail: Avail) -> Self {
        Self {
            task,
            sample: Sample::Avail(avail),
            timestamp: Utc::now(),
        }
    }

    /// Sentinel outcome for a task whose sample could not be obtained.
    pub fn unknown(task: Arc<Task>) -> Self {
        Self::avail(task, Avail::Unknown)
    }

    pub fn key(&self) -> StorageKey {
        StorageKey::for_task(&self.task)
    }

    pub fn as_avail(&self) -> Option<Avail> {
        match self.sample {
            Sample::Avail(a) => Some(a),
            Sample::Metric(_) => None,
        }
    }

    pub fn as_metric(&self) -> Option<f64> {
        match self.sample {
            Sample::Metric(v) => Some(v),
            Sample::Avail(_) => None,
        }
    }
}
