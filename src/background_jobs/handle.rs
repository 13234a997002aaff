use super::job::{BackgroundJob, JobError, JobSchedule};
use crate::server_store::{JobRun, JobRunStatus, RunTrigger, ServerStore};
use anyhow::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Registered job as shown by the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub schedule: JobScheduleInfo,
    pub is_running: bool,
    pub last_run: Option<JobRunInfo>,
    pub next_run_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobScheduleInfo {
    Cron { expression: String },
    Interval { every_secs: u64 },
}

impl From<JobSchedule> for JobScheduleInfo {
    fn from(schedule: JobSchedule) -> Self {
        match schedule {
            JobSchedule::Cron(expression) => JobScheduleInfo::Cron { expression },
            JobSchedule::Interval(every) => JobScheduleInfo::Interval {
                every_secs: every.as_secs(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRunInfo {
    pub id: i64,
    pub trigger: RunTrigger,
    pub status: JobRunStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_secs: Option<i64>,
    pub affected: usize,
    pub summary: Option<String>,
    pub error_message: Option<String>,
}

impl From<JobRun> for JobRunInfo {
    fn from(run: JobRun) -> Self {
        JobRunInfo {
            id: run.id,
            trigger: run.trigger,
            status: run.status,
            started_at: run.started_at.to_rfc3339(),
            finished_at: run.finished_at.map(|at| at.to_rfc3339()),
            duration_secs: run
                .finished_at
                .map(|at| (at - run.started_at).num_seconds()),
            affected: run.affected,
            summary: run.summary,
            error_message: run.error_message,
        }
    }
}

pub(super) enum SchedulerCommand {
    Trigger {
        job_id: String,
        reply: oneshot::Sender<Result<(), JobError>>,
    },
}

/// Jobs known to the scheduler and which of them are running right now.
#[derive(Default)]
pub(super) struct Registry {
    pub jobs: HashMap<String, Arc<dyn BackgroundJob>>,
    pub running: HashSet<String>,
}

/// Cloneable access to the scheduler for HTTP handlers.
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<SchedulerCommand>,
    registry: Arc<RwLock<Registry>>,
    server_store: Arc<dyn ServerStore>,
}

impl SchedulerHandle {
    pub(super) fn new(
        commands: mpsc::Sender<SchedulerCommand>,
        registry: Arc<RwLock<Registry>>,
        server_store: Arc<dyn ServerStore>,
    ) -> Self {
        Self {
            commands,
            registry,
            server_store,
        }
    }

    fn describe(&self, job: &dyn BackgroundJob, is_running: bool) -> Result<JobInfo> {
        let id = job.id();
        Ok(JobInfo {
            id: id.to_string(),
            name: job.name().to_string(),
            description: job.description().to_string(),
            schedule: job.schedule().into(),
            is_running,
            last_run: self.server_store.get_last_run(id)?.map(JobRunInfo::from),
            next_run_at: self
                .server_store
                .get_schedule_state(id)?
                .map(|state| state.next_run_at.to_rfc3339()),
        })
    }

    /// All registered jobs, sorted by id.
    pub async fn list_jobs(&self) -> Result<Vec<JobInfo>> {
        let registry = self.registry.read().await;
        let mut jobs = registry
            .jobs
            .values()
            .map(|job| self.describe(job.as_ref(), registry.running.contains(job.id())))
            .collect::<Result<Vec<_>>>()?;
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(jobs)
    }

    pub async fn job_exists(&self, job_id: &str) -> bool {
        self.registry.read().await.jobs.contains_key(job_id)
    }

    /// Starts a job now. Fails if it is unknown or already running.
    pub async fn trigger_job(&self, job_id: &str) -> Result<(), JobError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SchedulerCommand::Trigger {
                job_id: job_id.to_string(),
                reply,
            })
            .await
            .map_err(|_| JobError::ExecutionFailed("Scheduler is not running".to_string()))?;
        response
            .await
            .map_err(|_| JobError::ExecutionFailed("Scheduler dropped the request".to_string()))?
    }

    pub fn get_job_history(&self, job_id: &str, limit: usize) -> Result<Vec<JobRunInfo>> {
        Ok(self
            .server_store
            .get_run_history(job_id, limit)?
            .into_iter()
            .map(JobRunInfo::from)
            .collect())
    }
}
