use thiserror::Error;
use vigil_core::{Interval, Kind, TaskType};

/// A task was added to a [`crate::TaskGroup`] it does not belong to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("Task [{task}] has type {actual}, group expects {expected}")]
    TypeMismatch {
        task: String,
        expected: TaskType,
        actual: TaskType,
    },

    #[error("Task [{task}] has interval {actual}, group expects {expected}")]
    IntervalMismatch {
        task: String,
        expected: Interval,
        actual: Interval,
    },

    #[error("Task [{task}] has kind {actual}, group expects {expected}")]
    KindMismatch {
        task: String,
        expected: Kind,
        actual: Kind,
    },
}

/// Failure raised by a protocol session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No session factory registered for {0}")]
    NoFactory(String),

    #[error("Failed to open session to {endpoint}: {reason}")]
    Open { endpoint: String, reason: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Failure reported to [`crate::CompletionHandler::on_failed`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Cannot decode result for task [{task}]: {reason}")]
    Decode { task: String, reason: String },

    #[error("Read failed for task [{task}]: {reason}")]
    StepFailed { task: String, reason: String },

    #[error("Response has no result for task [{task}] at position {index}")]
    MissingResult { task: String, index: usize },
}

/// Failure raised by a storage adapter.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage rejected batch: {0}")]
    Rejected(String),
}

/// Failure of the scheduler driver itself.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Scheduler already started (state: {0})")]
    AlreadyStarted(String),
}
