//! Daily scraper runs using tokio-cron-scheduler.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info, warn};

use crate::ingest::{IngestError, Orchestrator};
use crate::models::RunTrigger;

/// Default schedule: 22:00 UTC, i.e. 06:00 Singapore time.
pub const DEFAULT_SCHEDULE: &str = "0 0 22 * * *";

/// Start a scheduler that triggers a scraper run on `cron` (six fields, UTC).
///
/// Keep the returned scheduler alive for as long as runs should fire.
pub async fn start_scheduler(
    orchestrator: Arc<Orchestrator>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            match orchestrator.run(RunTrigger::Scheduled).await {
                Ok(summary) => info!("Scheduled scraper run finished: {}", summary.message()),
                Err(IngestError::RunInProgress) => {
                    warn!("Skipping scheduled run: another run is in progress")
                }
                Err(e) => error!("Scheduled scraper run failed: {}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Scraper scheduled with cron '{}' (UTC)", cron);
    Ok(scheduler)
}

/// Check that `cron` parses without starting anything.
pub fn validate_schedule(cron: &str) -> Result<(), JobSchedulerError> {
    Job::new_async(cron, |_uuid, _lock| Box::pin(async {})).map(|_| ())
}
