//! Scheduler driver: interval clock plus worker pool.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructor, task registration, state
//! - `execution`: main loop, group dispatch and graceful shutdown
//! - `scheduling`: per-interval deadlines and due-task collection

mod core;
mod execution;
mod scheduling;

pub use self::core::{Scheduler, SchedulerHandle, SchedulerState};
