use chrono::{DateTime, Utc};
use serde::Serialize;

/// What started a background run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTrigger {
    Schedule,
    /// Started from the admin API.
    Manual,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Schedule => "schedule",
            RunTrigger::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "manual" => RunTrigger::Manual,
            _ => RunTrigger::Schedule,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobRunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobRunStatus::Running => "running",
            JobRunStatus::Completed => "completed",
            JobRunStatus::Failed => "failed",
            JobRunStatus::Cancelled => "cancelled",
        }
    }

    /// Unknown values read as failed.
    pub fn parse(s: &str) -> Self {
        match s {
            "running" => JobRunStatus::Running,
            "completed" => JobRunStatus::Completed,
            "cancelled" => JobRunStatus::Cancelled,
            _ => JobRunStatus::Failed,
        }
    }
}

/// How a run ended, as handed to [`super::ServerStore::record_run_finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    Completed { affected: usize, summary: String },
    Failed(String),
    Cancelled,
}

impl RunResult {
    pub fn status(&self) -> JobRunStatus {
        match self {
            RunResult::Completed { .. } => JobRunStatus::Completed,
            RunResult::Failed(_) => JobRunStatus::Failed,
            RunResult::Cancelled => JobRunStatus::Cancelled,
        }
    }
}

/// One execution of a background job.
#[derive(Debug, Clone)]
pub struct JobRun {
    pub id: i64,
    pub job_id: String,
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: JobRunStatus,
    /// Rows touched by a completed run (jobs closed, emails sent...).
    pub affected: usize,
    pub summary: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JobScheduleState {
    pub job_id: String,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
}
