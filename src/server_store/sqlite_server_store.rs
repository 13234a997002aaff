use super::models::{JobRun, JobRunStatus, JobScheduleState, RunResult, RunTrigger};
use super::schema::SERVER_VERSIONED_SCHEMAS;
use super::ServerStore;
use crate::sqlite_persistence::open_versioned_db;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const RUN_COLUMNS: &str = "id, job_id, triggered_by, started_at, finished_at, status, \
                           affected, summary, error_message";

const INTERRUPTED_MESSAGE: &str = "Interrupted by a server restart";

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn row_to_run(row: &Row) -> rusqlite::Result<JobRun> {
    let trigger: String = row.get("triggered_by")?;
    let status: String = row.get("status")?;
    let finished_at: Option<i64> = row.get("finished_at")?;
    let affected: i64 = row.get("affected")?;
    Ok(JobRun {
        id: row.get("id")?,
        job_id: row.get("job_id")?,
        trigger: RunTrigger::parse(&trigger),
        started_at: from_unix(row.get("started_at")?),
        finished_at: finished_at.map(from_unix),
        status: JobRunStatus::parse(&status),
        affected: affected.max(0) as usize,
        summary: row.get("summary")?,
        error_message: row.get("error_message")?,
    })
}

/// [`ServerStore`] backed by its own SQLite file.
pub struct SqliteServerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteServerStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), SERVER_VERSIONED_SCHEMAS, "server")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn query_runs(&self, job_id: &str, limit: usize) -> Result<Vec<JobRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM background_runs WHERE job_id = ?1 ORDER BY id DESC LIMIT ?2",
            RUN_COLUMNS
        ))?;
        let runs = stmt
            .query_map(params![job_id, limit as i64], row_to_run)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}

impl ServerStore for SqliteServerStore {
    fn record_run_start(&self, job_id: &str, trigger: RunTrigger) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO background_runs (job_id, triggered_by, started_at, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                job_id,
                trigger.as_str(),
                Utc::now().timestamp(),
                JobRunStatus::Running.as_str()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn record_run_finish(&self, run_id: i64, result: &RunResult) -> Result<()> {
        let (affected, summary, error_message) = match result {
            RunResult::Completed { affected, summary } => {
                (*affected as i64, Some(summary.as_str()), None)
            }
            RunResult::Failed(message) => (0, None, Some(message.as_str())),
            RunResult::Cancelled => (0, None, None),
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE background_runs
             SET finished_at = ?1, status = ?2, affected = ?3, summary = ?4, error_message = ?5
             WHERE id = ?6",
            params![
                Utc::now().timestamp(),
                result.status().as_str(),
                affected,
                summary,
                error_message,
                run_id
            ],
        )?;
        Ok(())
    }

    fn get_run_history(&self, job_id: &str, limit: usize) -> Result<Vec<JobRun>> {
        self.query_runs(job_id, limit)
    }

    fn get_last_run(&self, job_id: &str) -> Result<Option<JobRun>> {
        Ok(self.query_runs(job_id, 1)?.into_iter().next())
    }

    fn fail_interrupted_runs(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(
            "UPDATE background_runs SET status = ?1, finished_at = ?2, error_message = ?3
             WHERE status = ?4",
            params![
                JobRunStatus::Failed.as_str(),
                Utc::now().timestamp(),
                INTERRUPTED_MESSAGE,
                JobRunStatus::Running.as_str()
            ],
        )?;
        Ok(count)
    }

    fn get_schedule_state(&self, job_id: &str) -> Result<Option<JobScheduleState>> {
        let conn = self.conn.lock().unwrap();
        let state = conn
            .query_row(
                "SELECT next_run_at, last_run_at FROM background_schedules WHERE job_id = ?1",
                params![job_id],
                |row| {
                    let last_run_at: Option<i64> = row.get(1)?;
                    Ok(JobScheduleState {
                        job_id: job_id.to_string(),
                        next_run_at: from_unix(row.get(0)?),
                        last_run_at: last_run_at.map(from_unix),
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    fn update_schedule_state(&self, state: &JobScheduleState) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO background_schedules (job_id, next_run_at, last_run_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(job_id) DO UPDATE SET next_run_at = ?2, last_run_at = ?3",
            params![
                state.job_id,
                state.next_run_at.timestamp(),
                state.last_run_at.map(|dt| dt.timestamp())
            ],
        )?;
        Ok(())
    }

    fn get_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT value FROM server_state WHERE key = ?1 AND expires_at > ?2",
                params![key, Utc::now().timestamp()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn put_state(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO server_state (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, expires_at = ?3",
            params![key, value, expires_at.timestamp()],
        )?;
        Ok(())
    }

    fn prune_expired_state(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute(
            "DELETE FROM server_state WHERE expires_at <= ?1",
            params![Utc::now().timestamp()],
        )?)
    }
}
