use crate::background_jobs::{BackgroundJob, JobContext, JobError, JobOutcome, JobSchedule};
use async_trait::async_trait;
use std::time::Duration;

/// Drops expired key/value entries, such as stale digest sent-caches.
pub struct StateCleanupJob;

#[async_trait]
impl BackgroundJob for StateCleanupJob {
    fn id(&self) -> &'static str {
        "state_cleanup"
    }

    fn name(&self) -> &'static str {
        "State Cleanup"
    }

    fn description(&self) -> &'static str {
        "Delete expired server state entries"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Interval(Duration::from_secs(6 * 60 * 60))
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobOutcome, JobError> {
        let removed = ctx.server_store.prune_expired_state()?;
        Ok(JobOutcome::new(
            removed,
            format!("Pruned {} expired state entries", removed),
        ))
    }
}
