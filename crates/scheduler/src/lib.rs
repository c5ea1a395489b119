//! Interval-based polling scheduler.
//!
//! Tasks sharing an interval are grouped by type and endpoint, each group is
//! executed as one batched request on a worker pool, and every task yields
//! exactly one data point per cycle. Data points flow through a
//! [`CompletionHandler`] to a buffered [`StorageDispatcher`].

pub mod completion;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod group;
pub mod grouping;
pub mod runnable;
pub mod session;
pub mod storage;

pub use completion::{ChannelCompletionHandler, CollectingHandler, CompletionHandler};
pub use config::SchedulerConfig;
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot, ProtocolStats, StorageStats};
pub use driver::{Scheduler, SchedulerHandle, SchedulerState};
pub use error::{GroupError, PollError, SchedulerError, SessionError, StorageError};
pub use group::{GroupKey, TaskGroup};
pub use grouping::group_tasks;
pub use runnable::BatchRunnable;
pub use session::{
    BatchRequest, BatchResponse, ReadStep, Session, SessionFactories, SessionFactory,
    SessionGuard, StepOutcome, TargetOutcome,
};
pub use storage::{LogStorage, PointBatcher, StorageAdapter, StorageDispatcher, StorageDispatcherConfig};
