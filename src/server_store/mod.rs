//! Server bookkeeping kept apart from the hiring data: background run
//! history, scheduler state and a small expiring key/value cache.

mod models;
mod schema;
mod sqlite_server_store;

pub use models::*;
pub use schema::SERVER_VERSIONED_SCHEMAS;
pub use sqlite_server_store::SqliteServerStore;

use anyhow::Result;
use chrono::{DateTime, Utc};

pub trait ServerStore: Send + Sync {
    fn record_run_start(&self, job_id: &str, trigger: RunTrigger) -> Result<i64>;
    fn record_run_finish(&self, run_id: i64, result: &RunResult) -> Result<()>;
    /// Newest first.
    fn get_run_history(&self, job_id: &str, limit: usize) -> Result<Vec<JobRun>>;
    fn get_last_run(&self, job_id: &str) -> Result<Option<JobRun>>;
    /// Marks runs left `running` by a previous process as failed.
    fn fail_interrupted_runs(&self) -> Result<usize>;

    fn get_schedule_state(&self, job_id: &str) -> Result<Option<JobScheduleState>>;
    fn update_schedule_state(&self, state: &JobScheduleState) -> Result<()>;

    /// Live value for `key`; expired entries read as absent.
    fn get_state(&self, key: &str) -> Result<Option<String>>;
    /// Inserts or replaces `key`, resetting its expiry.
    fn put_state(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()>;
    /// Deletes every expired entry, returning how many were removed.
    fn prune_expired_state(&self) -> Result<usize>;
}
