use super::context::JobContext;
use super::handle::{Registry, SchedulerCommand, SchedulerHandle};
use super::job::{BackgroundJob, JobError, JobSchedule, ShutdownBehavior};
use crate::server::metrics;
use crate::server_store::{JobScheduleState, RunResult, RunTrigger, ServerStore};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Upper bound on how long the loop sleeps between schedule checks.
const MAX_IDLE: Duration = Duration::from_secs(60);

/// How long shutdown waits for each in-flight run.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

struct InFlight {
    task: JoinHandle<()>,
    cancel: CancellationToken,
    behavior: ShutdownBehavior,
}

/// Owns the registered jobs, fires them when due and records every run.
pub struct JobScheduler {
    registry: Arc<RwLock<Registry>>,
    in_flight: HashMap<String, InFlight>,
    /// Next fire time per job. Jobs with an unusable schedule are absent.
    next_runs: HashMap<String, DateTime<Utc>>,
    server_store: Arc<dyn ServerStore>,
    commands: mpsc::Receiver<SchedulerCommand>,
    shutdown_token: CancellationToken,
    job_context: JobContext,
}

/// Creates a scheduler and the handle used by the HTTP layer.
pub fn create_scheduler(
    server_store: Arc<dyn ServerStore>,
    shutdown_token: CancellationToken,
    job_context: JobContext,
) -> (JobScheduler, SchedulerHandle) {
    let (command_tx, commands) = mpsc::channel(32);
    let registry = Arc::new(RwLock::new(Registry::default()));

    let handle = SchedulerHandle::new(command_tx, Arc::clone(&registry), server_store.clone());
    let scheduler = JobScheduler {
        registry,
        in_flight: HashMap::new(),
        next_runs: HashMap::new(),
        server_store,
        commands,
        shutdown_token,
        job_context,
    };
    (scheduler, handle)
}

impl JobScheduler {
    /// Registers a job and computes its first fire time. Interval jobs fire
    /// right away, cron jobs at their next match.
    pub async fn register_job(&mut self, job: Arc<dyn BackgroundJob>) {
        let job_id = job.id().to_string();
        info!("Registering job {}: {}", job_id, job.description());

        let now = Utc::now();
        let first_run = match job.schedule() {
            JobSchedule::Interval(_) => Some(now),
            schedule => schedule.next_after(now),
        };
        match first_run {
            Some(at) => self.schedule_next(&job_id, at, None),
            None => warn!("Job {} has an invalid schedule and will only run manually", job_id),
        }

        self.registry.write().await.jobs.insert(job_id, job);
    }

    pub async fn job_count(&self) -> usize {
        self.registry.read().await.jobs.len()
    }

    fn schedule_next(
        &mut self,
        job_id: &str,
        next_run_at: DateTime<Utc>,
        last_run_at: Option<DateTime<Utc>>,
    ) {
        self.next_runs.insert(job_id.to_string(), next_run_at);
        let state = JobScheduleState {
            job_id: job_id.to_string(),
            next_run_at,
            last_run_at,
        };
        if let Err(e) = self.server_store.update_schedule_state(&state) {
            warn!("Failed to persist schedule of {}: {}", job_id, e);
        }
    }

    /// Main loop, returns once the shutdown token is cancelled.
    pub async fn run(&mut self) {
        info!("Job scheduler started with {} jobs", self.job_count().await);

        match self.server_store.fail_interrupted_runs() {
            Ok(0) => {}
            Ok(count) => info!("Marked {} interrupted runs as failed", count),
            Err(e) => error!("Failed to close interrupted runs: {}", e),
        }

        loop {
            self.reap_finished();
            let idle = self.time_until_next_run();
            debug!("Scheduler idle for {:?}", idle);

            tokio::select! {
                _ = tokio::time::sleep(idle) => self.fire_due_jobs().await,
                Some(command) = self.commands.recv() => self.handle_command(command).await,
                _ = self.shutdown_token.cancelled() => {
                    self.shutdown().await;
                    break;
                }
            }
        }

        info!("Job scheduler stopped");
    }

    async fn handle_command(&mut self, command: SchedulerCommand) {
        match command {
            SchedulerCommand::Trigger { job_id, reply } => {
                let result = self.trigger(&job_id).await;
                let _ = reply.send(result);
            }
        }
    }

    async fn trigger(&mut self, job_id: &str) -> Result<(), JobError> {
        let job = {
            let registry = self.registry.read().await;
            let job = registry.jobs.get(job_id).cloned().ok_or(JobError::NotFound)?;
            if registry.running.contains(job_id) {
                return Err(JobError::AlreadyRunning);
            }
            job
        };
        self.start_run(job, RunTrigger::Manual).await;
        Ok(())
    }

    fn time_until_next_run(&self) -> Duration {
        let now = Utc::now();
        self.next_runs
            .values()
            .map(|at| (*at - now).to_std().unwrap_or(Duration::ZERO))
            .min()
            .unwrap_or(MAX_IDLE)
            .min(MAX_IDLE)
    }

    async fn fire_due_jobs(&mut self) {
        let now = Utc::now();
        let due: Vec<String> = self
            .next_runs
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(job_id, _)| job_id.clone())
            .collect();

        for job_id in due {
            let (job, running) = {
                let registry = self.registry.read().await;
                (
                    registry.jobs.get(&job_id).cloned(),
                    registry.running.contains(&job_id),
                )
            };
            let Some(job) = job else { continue };

            // Counted from now so a slow run never queues up repeats.
            match job.schedule().next_after(now) {
                Some(next) => self.schedule_next(&job_id, next, Some(now)),
                None => {
                    self.next_runs.remove(&job_id);
                }
            }

            if running {
                debug!("Skipping {}: previous run still in progress", job_id);
                continue;
            }
            self.start_run(job, RunTrigger::Schedule).await;
        }
    }

    async fn start_run(&mut self, job: Arc<dyn BackgroundJob>, trigger: RunTrigger) {
        let job_id = job.id().to_string();
        let run_id = match self.server_store.record_run_start(&job_id, trigger) {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to record start of {}: {}", job_id, e);
                return;
            }
        };
        info!("Starting {} (run {}, {})", job_id, run_id, trigger.as_str());

        self.registry.write().await.running.insert(job_id.clone());

        let cancel = self.job_context.cancellation_token.child_token();
        let ctx = self.job_context.with_token(cancel.clone());
        let behavior = job.shutdown_behavior();
        let server_store = Arc::clone(&self.server_store);
        let registry = Arc::clone(&self.registry);
        let task_job_id = job_id.clone();

        let task = tokio::spawn(async move {
            let started = Instant::now();
            // A panic in the job surfaces here as a JoinError.
            let joined = tokio::spawn(async move { job.execute(&ctx).await }).await;
            let result = match joined {
                Ok(Ok(outcome)) => RunResult::Completed {
                    affected: outcome.affected,
                    summary: outcome.summary,
                },
                Ok(Err(JobError::Cancelled)) => RunResult::Cancelled,
                Ok(Err(e)) => RunResult::Failed(e.to_string()),
                Err(e) => RunResult::Failed(format!("Job panicked: {}", e)),
            };
            finish_run(&task_job_id, run_id, result, started.elapsed(), &*server_store);
            registry.write().await.running.remove(&task_job_id);
        });

        self.in_flight.insert(
            job_id,
            InFlight {
                task,
                cancel,
                behavior,
            },
        );
    }

    fn reap_finished(&mut self) {
        self.in_flight.retain(|_, run| !run.task.is_finished());
    }

    async fn shutdown(&mut self) {
        info!("Stopping {} in-flight jobs", self.in_flight.len());
        let mut tasks = Vec::new();
        for (job_id, run) in self.in_flight.drain() {
            match run.behavior {
                ShutdownBehavior::Cancellable => {
                    debug!("Cancelling {}", job_id);
                    run.cancel.cancel();
                }
                ShutdownBehavior::WaitForCompletion => info!("Waiting for {} to finish", job_id),
            }
            tasks.push(run.task);
        }
        for task in tasks {
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, task).await;
        }
    }
}

fn finish_run(
    job_id: &str,
    run_id: i64,
    result: RunResult,
    elapsed: Duration,
    server_store: &dyn ServerStore,
) {
    match &result {
        RunResult::Completed { summary, .. } => {
            info!("{} completed in {:?}: {}", job_id, elapsed, summary)
        }
        RunResult::Cancelled => info!("{} cancelled after {:?}", job_id, elapsed),
        RunResult::Failed(message) => {
            error!("{} failed after {:?}: {}", job_id, elapsed, message)
        }
    }
    let affected = match &result {
        RunResult::Completed { affected, .. } => *affected,
        _ => 0,
    };
    metrics::record_background_job_run(job_id, result.status().as_str(), affected, elapsed);
    if let Err(e) = server_store.record_run_finish(run_id, &result) {
        error!("Failed to record end of {} run {}: {}", job_id, run_id, e);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::email::{EmailService, LogEmailSender};
    use crate::job::JobManager;
    use crate::server_store::SqliteServerStore;
    use crate::store::SqliteStore;
    use crate::subscriber::SubscriberManager;
    use tempfile::TempDir;

    pub fn job_context(
        temp_dir: &TempDir,
        token: CancellationToken,
    ) -> (JobContext, Arc<SqliteStore>, Arc<SqliteServerStore>) {
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("jobhunter.db")).unwrap());
        let server_store =
            Arc::new(SqliteServerStore::new(temp_dir.path().join("server.db")).unwrap());
        let ctx = JobContext::new(
            token,
            Arc::new(JobManager::new(store.clone())),
            Arc::new(SubscriberManager::new(
                store.clone(),
                server_store.clone(),
                EmailService::new(Arc::new(LogEmailSender)),
            )),
            server_store.clone(),
        );
        (ctx, store, server_store)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::job_context;
    use super::*;
    use crate::background_jobs::{JobOutcome, JobScheduleInfo};
    use crate::server_store::JobRunStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingJob {
        id: &'static str,
        schedule: JobSchedule,
        runs: Arc<AtomicUsize>,
        fail: AtomicBool,
    }

    impl CountingJob {
        fn new(id: &'static str, schedule: JobSchedule) -> Self {
            Self {
                id,
                schedule,
                runs: Arc::new(AtomicUsize::new(0)),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl BackgroundJob for CountingJob {
        fn id(&self) -> &'static str {
            self.id
        }

        fn name(&self) -> &'static str {
            "Counting"
        }

        fn description(&self) -> &'static str {
            "Counts its runs"
        }

        fn schedule(&self) -> JobSchedule {
            self.schedule.clone()
        }

        async fn execute(&self, _ctx: &JobContext) -> Result<JobOutcome, JobError> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(JobError::ExecutionFailed("boom".to_string()));
            }
            Ok(JobOutcome::new(run, format!("run #{}", run)))
        }
    }

    fn scheduler_in(
        temp_dir: &TempDir,
        shutdown_token: CancellationToken,
    ) -> (JobScheduler, SchedulerHandle) {
        let (ctx, _store, server_store) = job_context(temp_dir, shutdown_token.child_token());
        create_scheduler(server_store, shutdown_token, ctx)
    }

    /// Midnight on January 1st: never due while a test runs.
    const YEARLY: &str = "0 0 0 1 1 *";

    #[tokio::test]
    async fn lists_registered_jobs_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let (mut scheduler, handle) = scheduler_in(&temp_dir, CancellationToken::new());

        for id in ["job_b", "job_a"] {
            let job = CountingJob::new(id, JobSchedule::Cron(YEARLY.to_string()));
            scheduler.register_job(Arc::new(job)).await;
        }

        assert_eq!(scheduler.job_count().await, 2);
        let jobs = handle.list_jobs().await.unwrap();
        assert_eq!(jobs[0].id, "job_a");
        assert_eq!(jobs[1].id, "job_b");
        assert_eq!(
            jobs[0].schedule,
            JobScheduleInfo::Cron {
                expression: YEARLY.to_string()
            }
        );
        let next_run_at = jobs[0].next_run_at.as_deref().expect("cron job has a next run");
        assert!(next_run_at.contains("-01-01T00:00:00"), "{}", next_run_at);
        assert!(!jobs[0].is_running);
        assert!(jobs[0].last_run.is_none());
        assert!(handle.job_exists("job_a").await);
        assert!(!handle.job_exists("nope").await);
    }

    #[tokio::test]
    async fn interval_jobs_run_on_startup_with_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let shutdown_token = CancellationToken::new();
        let (mut scheduler, handle) = scheduler_in(&temp_dir, shutdown_token.clone());

        let job = CountingJob::new("interval_job", JobSchedule::Interval(Duration::from_secs(3600)));
        let runs = job.runs.clone();
        scheduler.register_job(Arc::new(job)).await;

        let running = tokio::spawn(async move { scheduler.run().await });
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        let history = handle.get_job_history("interval_job", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, JobRunStatus::Completed);
        assert_eq!(history[0].trigger, RunTrigger::Schedule);
        assert_eq!(history[0].affected, 1);
        assert_eq!(history[0].summary.as_deref(), Some("run #1"));

        shutdown_token.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(2), running).await;
    }

    #[tokio::test]
    async fn manual_trigger_records_failure() {
        let temp_dir = TempDir::new().unwrap();
        let shutdown_token = CancellationToken::new();
        let (mut scheduler, handle) = scheduler_in(&temp_dir, shutdown_token.clone());

        let job = CountingJob::new("failing_job", JobSchedule::Cron(YEARLY.to_string()));
        job.fail.store(true, Ordering::SeqCst);
        scheduler.register_job(Arc::new(job)).await;

        let running = tokio::spawn(async move { scheduler.run().await });

        handle.trigger_job("failing_job").await.unwrap();
        assert!(matches!(
            handle.trigger_job("missing").await,
            Err(JobError::NotFound)
        ));
        tokio::time::sleep(Duration::from_millis(300)).await;

        let history = handle.get_job_history("failing_job", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, JobRunStatus::Failed);
        assert_eq!(history[0].trigger, RunTrigger::Manual);
        assert!(history[0].error_message.as_deref().unwrap().contains("boom"));

        shutdown_token.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(2), running).await;
    }
}
