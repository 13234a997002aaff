use super::context::JobContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// When a job should run.
#[derive(Debug, Clone)]
pub enum JobSchedule {
    /// Six-field cron expression (seconds first), evaluated in UTC.
    Cron(String),
    /// Fixed interval, first run right after startup.
    Interval(Duration),
}

impl JobSchedule {
    /// Next fire time strictly after `after`. None for an unparseable cron expression.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            JobSchedule::Cron(expr) => cron::Schedule::from_str(expr)
                .ok()
                .and_then(|schedule| schedule.after(&after).next()),
            JobSchedule::Interval(interval) => {
                chrono::Duration::from_std(*interval).ok().map(|d| after + d)
            }
        }
    }
}

/// What a successful run did, kept in the run history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub affected: usize,
    pub summary: String,
}

impl JobOutcome {
    pub fn new(affected: usize, summary: impl Into<String>) -> Self {
        Self {
            affected,
            summary: summary.into(),
        }
    }
}

/// How a job is handled during server shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownBehavior {
    #[default]
    Cancellable,
    WaitForCompletion,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found")]
    NotFound,
    #[error("Job is already running")]
    AlreadyRunning,
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Job was cancelled")]
    Cancelled,
}

impl From<crate::error::HiringError> for JobError {
    fn from(err: crate::error::HiringError) -> Self {
        JobError::ExecutionFailed(err.to_string())
    }
}

impl From<anyhow::Error> for JobError {
    fn from(err: anyhow::Error) -> Self {
        JobError::ExecutionFailed(format!("{:#}", err))
    }
}

#[async_trait]
pub trait BackgroundJob: Send + Sync {
    /// Unique identifier, used in the admin API and the run history.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn schedule(&self) -> JobSchedule;

    fn shutdown_behavior(&self) -> ShutdownBehavior {
        ShutdownBehavior::Cancellable
    }

    /// Runs the job. Long-running work should check `ctx.is_cancelled()`.
    async fn execute(&self, ctx: &JobContext) -> Result<JobOutcome, JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cron_schedule_fires_at_next_match() {
        let after = Utc.with_ymd_and_hms(2024, 3, 10, 8, 15, 0).unwrap();

        let daily = JobSchedule::Cron("0 0 9 * * *".to_string());
        assert_eq!(
            daily.next_after(after),
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap())
        );

        let half_hourly = JobSchedule::Cron("0 */30 * * * *".to_string());
        assert_eq!(
            half_hourly.next_after(after),
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn yearly_cron_fires_next_january() {
        let after = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let yearly = JobSchedule::Cron("0 0 0 1 1 *".to_string());
        assert_eq!(
            yearly.next_after(after),
            Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn interval_schedule_adds_duration() {
        let after = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let schedule = JobSchedule::Interval(Duration::from_secs(6 * 3600));
        assert_eq!(
            schedule.next_after(after),
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap())
        );
    }

    #[test]
    fn invalid_cron_has_no_next_run() {
        let schedule = JobSchedule::Cron("every day".to_string());
        assert!(schedule.next_after(Utc::now()).is_none());
    }
}
