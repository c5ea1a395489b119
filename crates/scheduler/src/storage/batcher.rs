//! Batching of collected data points on their way to storage.
//!
//! A batch closes when it holds `max_points` points or when its oldest
//! point has waited `max_age`. The clock is passed in by the caller so the
//! dispatcher measures every decision against one `Instant`.

use std::time::{Duration, Instant};

use vigil_core::DataPoint;

/// Open batch of data points awaiting storage.
pub struct PointBatcher {
    points: Vec<DataPoint>,
    max_points: usize,
    max_age: Duration,
    /// Arrival of the oldest buffered point.
    opened_at: Option<Instant>,
}

impl PointBatcher {
    pub fn new(max_points: usize, max_age: Duration) -> Self {
        let max_points = max_points.max(1);
        Self {
            points: Vec::with_capacity(max_points),
            max_points,
            max_age,
            opened_at: None,
        }
    }

    /// Buffer `point`. Returns the closed batch when this point filled it.
    pub fn push(&mut self, point: DataPoint, now: Instant) -> Option<Vec<DataPoint>> {
        self.opened_at.get_or_insert(now);
        self.points.push(point);
        (self.points.len() >= self.max_points).then(|| self.drain())
    }

    /// Close the batch if its oldest point has waited `max_age`.
    pub fn take_expired(&mut self, now: Instant) -> Option<Vec<DataPoint>> {
        let opened_at = self.opened_at?;
        (now.saturating_duration_since(opened_at) >= self.max_age).then(|| self.drain())
    }

    /// How long the dispatcher may block before the open batch expires.
    /// `None` when nothing is buffered.
    pub fn wait_time(&self, now: Instant) -> Option<Duration> {
        self.opened_at
            .map(|opened_at| self.max_age.saturating_sub(now.saturating_duration_since(opened_at)))
    }

    /// Take every buffered point regardless of size or age.
    pub fn drain(&mut self) -> Vec<DataPoint> {
        self.opened_at = None;
        std::mem::replace(&mut self.points, Vec::with_capacity(self.max_points))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
