#![deny(missing_docs)]
//! MemeRelay runtime helpers.
//!
//! Provides the transport-agnostic scheduler driving restocks and batches.

/// Bindings from scheduled jobs to pipeline operations.
pub mod jobs;
/// Cron job registry and timer loop.
pub mod scheduler;

pub use jobs::{build_schedule, RelayJobs};
pub use scheduler::{
    spawn_scheduler, Clock, Job, JobAction, JobRunner, Schedule, ScheduleError, SystemClock,
};
