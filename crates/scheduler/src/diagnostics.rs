//! Runtime diagnostics for the polling pipeline.
//!
//! A single [`Diagnostics`] handle is shared by the driver, the batch
//! runnables and the storage dispatcher. [`Diagnostics::snapshot`] returns a
//! serializable copy that the driver logs periodically.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use vigil_core::Protocol;

/// Request statistics for one protocol.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProtocolStats {
    /// Combined requests executed.
    pub requests: u64,
    /// Mean round-trip duration.
    pub avg_request: Duration,
    /// Slowest round trip seen.
    pub max_request: Duration,
    /// Errors (group and per-task) attributed to this protocol.
    pub errors: u64,
    /// Round trips that took longer than their group's interval.
    pub delayed: u64,
}

/// Storage pipeline statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    /// Data points accepted into the storage queue.
    pub queued: u64,
    /// Data points dropped because the queue was full.
    pub dropped: u64,
    /// Data points handed to the storage adapter.
    pub stored: u64,
    /// Batches the adapter failed to store.
    pub errors: u64,
    /// Data points currently buffered in the dispatcher.
    pub buffered: usize,
}

/// Point-in-time copy of all diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSnapshot {
    pub protocols: BTreeMap<Protocol, ProtocolStats>,
    pub storage: StorageStats,
    /// Metric data points produced.
    pub metrics_collected: u64,
    /// Availability data points produced.
    pub avails_collected: u64,
    /// Groups submitted to the worker pool.
    pub groups_dispatched: u64,
    pub taken_at: DateTime<Utc>,
}

impl Default for DiagnosticsSnapshot {
    fn default() -> Self {
        Self {
            protocols: BTreeMap::new(),
            storage: StorageStats::default(),
            metrics_collected: 0,
            avails_collected: 0,
            groups_dispatched: 0,
            taken_at: Utc::now(),
        }
    }
}

/// Shared diagnostics handle. Poisoned locks are skipped, never propagated.
#[derive(Debug, Default)]
pub struct Diagnostics {
    state: RwLock<DiagnosticsSnapshot>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, f: impl FnOnce(&mut DiagnosticsSnapshot)) {
        if let Ok(mut state) = self.state.write() {
            f(&mut state);
        }
    }

    /// Record one combined request round trip.
    pub fn record_request(&self, protocol: Protocol, duration: Duration) {
        self.update(|s| {
            let stats = s.protocols.entry(protocol).or_default();
            stats.requests += 1;
            // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
            stats.avg_request = if stats.requests == 1 {
                duration
            } else {
                let prev = stats.avg_request.as_nanos() as f64;
                let cur = duration.as_nanos() as f64;
                Duration::from_nanos((prev + (cur - prev) / stats.requests as f64) as u64)
            };
            stats.max_request = stats.max_request.max(duration);
        });
    }

    pub fn mark_error(&self, protocol: Protocol) {
        self.update(|s| s.protocols.entry(protocol).or_default().errors += 1);
    }

    pub fn mark_delayed(&self, protocol: Protocol) {
        self.update(|s| s.protocols.entry(protocol).or_default().delayed += 1);
    }

    pub fn mark_metric(&self) {
        self.update(|s| s.metrics_collected += 1);
    }

    pub fn mark_avail(&self) {
        self.update(|s| s.avails_collected += 1);
    }

    pub fn mark_group_dispatched(&self) {
        self.update(|s| s.groups_dispatched += 1);
    }

    pub fn mark_queued(&self) {
        self.update(|s| s.storage.queued += 1);
    }

    pub fn mark_dropped(&self) {
        self.update(|s| s.storage.dropped += 1);
    }

    pub fn record_stored(&self, count: usize) {
        self.update(|s| s.storage.stored += count as u64);
    }

    pub fn mark_storage_error(&self) {
        self.update(|s| s.storage.errors += 1);
    }

    pub fn set_buffered(&self, buffered: usize) {
        self.update(|s| s.storage.buffered = buffered);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let mut snapshot = self.state.read().map(|s| s.clone()).unwrap_or_default();
        snapshot.taken_at = Utc::now();
        snapshot
    }

    /// Log a one-line summary of the current snapshot.
    pub fn report(&self) {
        let snapshot = self.snapshot();
        for (protocol, stats) in &snapshot.protocols {
            info!(
                protocol = %protocol,
                requests = stats.requests,
                avg_request_ms = stats.avg_request.as_millis() as u64,
                max_request_ms = stats.max_request.as_millis() as u64,
                errors = stats.errors,
                delayed = stats.delayed,
                "DIAGNOSTICS protocol"
            );
        }
        info!(
            metrics = snapshot.metrics_collected,
            avails = snapshot.avails_collected,
            groups = snapshot.groups_dispatched,
            queued = snapshot.storage.queued,
            dropped = snapshot.storage.dropped,
            stored = snapshot.storage.stored,
            storage_errors = snapshot.storage.errors,
            buffered = snapshot.storage.buffered,
            "DIAGNOSTICS"
        );
    }
}
