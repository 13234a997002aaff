//! The platform's scheduled jobs.

mod expired_jobs;
mod hired_quota;
mod state_cleanup;
mod subscriber_digest;

pub use expired_jobs::ExpiredJobsJob;
pub use hired_quota::HiredQuotaJob;
pub use state_cleanup::StateCleanupJob;
pub use subscriber_digest::SubscriberDigestJob;
