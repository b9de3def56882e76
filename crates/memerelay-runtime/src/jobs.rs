use crate::scheduler::{Job, JobAction, JobRunner, Schedule, ScheduleError};
use async_trait::async_trait;
use memerelay_core::config::RelaySettings;
use memerelay_core::dispatcher::EmergencyRestock;
use memerelay_core::error::{ConfigurationError, DispatchError};
use memerelay_core::Relay;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Builds the restock and batch jobs from the configured cadences.
///
/// # Errors
///
/// Returns a [`ScheduleError`] if either cron expression is invalid.
pub fn build_schedule(settings: &RelaySettings) -> Result<Schedule, ScheduleError> {
    let mut schedule = Schedule::new();
    schedule
        .register("restock", &settings.restock_cron, JobAction::Restock)?
        .register("batch", &settings.batch_cron, JobAction::Batch)?;
    Ok(schedule)
}

/// [`JobRunner`] invoking the pipeline. Failures are logged, never propagated.
pub struct RelayJobs {
    relay: Arc<Relay>,
}

impl RelayJobs {
    /// Runner over `relay`.
    #[must_use]
    pub const fn new(relay: Arc<Relay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl JobRunner for RelayJobs {
    async fn run(&self, job: &Job) {
        match job.action {
            JobAction::Restock => match self.relay.supplier.restock().await {
                Ok(report) => info!(
                    "[{}] Added {}, queue {}",
                    job.name, report.added, report.queue_size
                ),
                Err(e) => error!("[{}] Restock failed: {e}", job.name),
            },
            JobAction::Batch => match self.relay.dispatcher.run_batch().await {
                Ok(report) => {
                    if let Some(EmergencyRestock::Failed(reason)) = &report.restock {
                        warn!("[{}] Emergency restock failed: {reason}", job.name);
                    }
                    info!("[{}] Sent {} items", job.name, report.sent.len());
                }
                Err(DispatchError::Configuration(ConfigurationError::NoDestination)) => {
                    info!("[{}] No Target Group Set", job.name);
                }
                Err(e) => error!("[{}] Batch failed: {e}", job.name),
            },
        }
    }
}
