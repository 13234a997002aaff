use crate::background_jobs::{
    BackgroundJob, JobContext, JobError, JobOutcome, JobSchedule, ShutdownBehavior,
};
use async_trait::async_trait;

/// Mails subscribers the new jobs matching their skills.
pub struct SubscriberDigestJob {
    cron: String,
}

impl SubscriberDigestJob {
    pub fn new(cron: impl Into<String>) -> Self {
        Self { cron: cron.into() }
    }
}

impl Default for SubscriberDigestJob {
    fn default() -> Self {
        Self::new("0 0 9 * * *")
    }
}

#[async_trait]
impl BackgroundJob for SubscriberDigestJob {
    fn id(&self) -> &'static str {
        "subscriber_digest"
    }

    fn name(&self) -> &'static str {
        "Subscriber Digest"
    }

    fn description(&self) -> &'static str {
        "Email subscribers the active jobs matching their skills"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Cron(self.cron.clone())
    }

    // A half-sent digest would mail the rest again next morning.
    fn shutdown_behavior(&self) -> ShutdownBehavior {
        ShutdownBehavior::WaitForCompletion
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobOutcome, JobError> {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        let sent = ctx.subscriber_manager.send_digest().await?;
        Ok(JobOutcome::new(sent, format!("Sent {} digest emails", sent)))
    }
}
