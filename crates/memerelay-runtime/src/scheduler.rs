//! Cron-driven job registry.
//!
//! [`Schedule::next_due`] is a pure function of the registered cadences and a
//! given instant; the timer loop only sleeps until that instant and hands the
//! due jobs to a [`JobRunner`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use croner::Cron;
use memerelay_core::pacing::Sleeper;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors raised while building a schedule.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The cadence expression could not be parsed
    #[error("Invalid cron expression '{expression}' for job {job}: {message}")]
    InvalidCron {
        /// Job name
        job: String,
        /// Offending expression
        expression: String,
        /// Parser message
        message: String,
    },
}

/// What a job does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    /// Run an ingestion cycle
    Restock,
    /// Run a dispatch batch
    Batch,
}

/// A named job with its cadence.
#[derive(Debug, Clone)]
pub struct Job {
    /// Name used in logs
    pub name: String,
    /// Original cadence expression
    pub expression: String,
    /// Action to invoke
    pub action: JobAction,
    cron: Cron,
}

impl Job {
    /// Next firing strictly after `after`.
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.cron.find_next_occurrence(&after, false).ok()
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Executes fired jobs.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Runs one job to completion.
    async fn run(&self, job: &Job);
}

/// Registry of jobs.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    jobs: Vec<Job>,
}

impl Schedule {
    /// Empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job under a standard five-field cron expression.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidCron`] if the expression does not parse.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        expression: &str,
        action: JobAction,
    ) -> Result<&mut Self, ScheduleError> {
        let name = name.into();
        let cron = Cron::new(expression)
            .parse()
            .map_err(|e| ScheduleError::InvalidCron {
                job: name.clone(),
                expression: expression.to_string(),
                message: e.to_string(),
            })?;
        self.jobs.push(Job {
            name,
            expression: expression.to_string(),
            action,
            cron,
        });
        Ok(self)
    }

    /// Registered jobs in registration order.
    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Earliest firing after `after` and every job due at that instant, in
    /// registration order.
    #[must_use]
    pub fn next_due(&self, after: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<&Job>)> {
        let upcoming: Vec<_> = self
            .jobs
            .iter()
            .filter_map(|job| job.next_after(after).map(|at| (at, job)))
            .collect();
        let earliest = upcoming.iter().map(|(at, _)| *at).min()?;
        let due = upcoming
            .into_iter()
            .filter(|(at, _)| *at == earliest)
            .map(|(_, job)| job)
            .collect();
        Some((earliest, due))
    }
}

/// Spawns the timer loop until `shutdown` is cancelled.
///
/// Jobs run one after another on the loop task, so a long batch delays
/// whatever is due next rather than overlapping it.
pub fn spawn_scheduler(
    schedule: Schedule,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    runner: Arc<dyn JobRunner>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for job in schedule.jobs() {
            info!("[Scheduler] {} registered ({})", job.name, job.expression);
        }

        let mut cursor = clock.now();
        loop {
            let Some((at, due)) = schedule.next_due(cursor) else {
                warn!("[Scheduler] No upcoming jobs, stopping");
                break;
            };

            let wait = (at - clock.now()).to_std().unwrap_or_default();
            debug!("[Scheduler] Next run at {at} in {}s", wait.as_secs());
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = sleeper.sleep(wait) => {}
            }

            for job in due {
                if shutdown.is_cancelled() {
                    return;
                }
                info!("[Scheduler] Running {}", job.name);
                runner.run(job).await;
            }
            cursor = at.max(clock.now());
        }
        info!("[Scheduler] Stopped");
    })
}
