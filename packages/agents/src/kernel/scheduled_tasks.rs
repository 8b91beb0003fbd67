//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (AGENT_CYCLE_SCHEDULE, hourly by default)
//!     │
//!     └─► Orchestrator::run_full_cycle(None)
//!             └─► OrgSync → EventAnalysis → SupplyDemand → VolunteerMatch
//! ```
//!
//! A cycle that is still running when the next tick fires is reported as
//! already running and skipped.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::pipeline::{CycleOutcome, Orchestrator};

/// Start the periodic full-cycle job.
pub async fn start_scheduler(orchestrator: Arc<Orchestrator>, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let cycle_job = Job::new_async(schedule, move |_uuid, _lock| {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            run_scheduled_cycle(&orchestrator).await;
        })
    })
    .with_context(|| format!("invalid cycle schedule {schedule:?}"))?;

    scheduler.add(cycle_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %schedule, "Scheduled agent cycle started");
    Ok(scheduler)
}

async fn run_scheduled_cycle(orchestrator: &Orchestrator) {
    tracing::info!("Running scheduled agent cycle");

    match orchestrator.run_full_cycle(None).await {
        CycleOutcome::Completed(aggregate) => {
            tracing::info!(
                completed = aggregate.cycle_summary.completed,
                failed = aggregate.cycle_summary.failed,
                skipped = aggregate.cycle_summary.skipped,
                "Scheduled agent cycle finished"
            );
        }
        CycleOutcome::AlreadyRunning => {
            tracing::warn!("Previous agent cycle still running, skipping this tick");
        }
        CycleOutcome::Failed(message) => {
            tracing::error!("Scheduled agent cycle failed: {}", message);
        }
    }
}
