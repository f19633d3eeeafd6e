//! Background job scheduler.
//!
//! When a cron expression is configured, registers an unattended discovery
//! run job. Scheduled runs go through the same orchestrator as API-triggered
//! ones, so the run mutual exclusion covers both paths.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use appscout_pipeline::{Orchestrator, PipelineError};

/// Builds and starts the scheduler when `run_cron` is configured.
///
/// Returns `None` when no cron is set. The returned handle must be kept
/// alive for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    orchestrator: Arc<Orchestrator>,
    run_cron: Option<&str>,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    let Some(cron) = run_cron else {
        tracing::info!("no run cron configured; scheduler disabled");
        return Ok(None);
    };

    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let orchestrator = Arc::clone(&orchestrator);

        Box::pin(async move {
            tracing::info!("scheduler: starting unattended discovery run");
            match orchestrator.start_run("scheduled", None, None).await {
                Ok(run) => {
                    tracing::info!(run_id = %run.public_id, "scheduler: discovery run started");
                }
                Err(PipelineError::AlreadyRunning) => {
                    tracing::warn!("scheduler: a run is already active, skipping this trigger");
                }
                Err(err) => {
                    tracing::error!(error = %err, "scheduler: failed to start discovery run");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(cron, "scheduler started with unattended discovery job");
    Ok(Some(scheduler))
}
