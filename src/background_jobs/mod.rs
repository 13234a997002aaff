//! Background job scheduling and execution.
//!
//! Jobs run on cron or fixed-interval schedules and can be triggered by hand
//! through the admin API. Every run is recorded in the server store.

mod context;
mod handle;
mod job;
pub mod jobs;
mod scheduler;

pub use context::JobContext;
pub use handle::{JobInfo, JobRunInfo, JobScheduleInfo, SchedulerHandle};
pub use job::{BackgroundJob, JobError, JobOutcome, JobSchedule, ShutdownBehavior};
pub use scheduler::{create_scheduler, JobScheduler};
