//! Domain persistence: users, companies, skills, jobs, resumes, subscribers,
//! notifications and the dashboard aggregates.

mod models;
mod schema;
mod sqlite_store;

pub use models::*;
pub use schema::STORE_VERSIONED_SCHEMAS;
pub use sqlite_store::SqliteStore;

use crate::notifications::{NewNotification, Notification};
use anyhow::Result;

/// True when a write was refused by a UNIQUE constraint, e.g. a second
/// account racing for the same email.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub trait UserStore: Send + Sync {
    /// Inserts a user and returns its id.
    fn create_user(&self, user: &NewUser) -> Result<i64>;

    /// Returns the user with the given id, active or not.
    fn get_user(&self, id: i64) -> Result<Option<User>>;

    /// Returns the user with the given email, active or not.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Overwrites the profile fields of a user. Returns false if the user does not exist.
    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<bool>;

    fn set_password_hash(&self, user_id: i64, password_hash: &str) -> Result<()>;

    /// Stores (or clears, with `None`) the refresh token of a user.
    fn set_refresh_token(&self, user_id: i64, token: Option<&str>) -> Result<()>;

    /// Returns the user whose stored refresh token and email both match.
    fn get_user_by_refresh_token(&self, token: &str, email: &str) -> Result<Option<User>>;

    /// Inserts a company and its first recruiter in one transaction and
    /// returns (company id, user id). `recruiter.company_id` is ignored.
    fn create_recruiter_with_company(
        &self,
        company: &CompanyDraft,
        recruiter: &NewUser,
    ) -> Result<(i64, i64)>;

    fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Paged<User>>;
}

pub trait CompanyStore: Send + Sync {
    fn create_company(&self, company: &CompanyDraft) -> Result<i64>;
    fn get_company(&self, id: i64) -> Result<Option<Company>>;
    /// Returns false if the company does not exist.
    fn update_company(&self, id: i64, company: &CompanyDraft) -> Result<bool>;
    fn list_companies(&self, filter: &CompanyFilter, page: PageRequest)
        -> Result<Paged<Company>>;
}

pub trait SkillStore: Send + Sync {
    /// Inserts a skill. Names are unique.
    fn create_skill(&self, name: &str) -> Result<i64>;
    fn get_skill(&self, id: i64) -> Result<Option<Skill>>;
    fn get_skill_by_name(&self, name: &str) -> Result<Option<Skill>>;
    fn list_skills(&self) -> Result<Vec<Skill>>;
    fn update_skill(&self, id: i64, name: &str) -> Result<bool>;
    /// Deletes a skill and unlinks it from jobs and subscribers.
    fn delete_skill(&self, id: i64) -> Result<bool>;
}

pub trait JobStore: Send + Sync {
    /// Inserts a PENDING, active job with its skill links.
    fn create_job(&self, job: &JobDraft, created_by: &str) -> Result<i64>;

    /// Returns the job with its company reference and skills.
    fn get_job(&self, id: i64) -> Result<Option<Job>>;

    /// Overwrites job fields and replaces its skill links.
    fn update_job(&self, id: i64, job: &JobDraft) -> Result<bool>;

    fn set_job_status(&self, id: i64, status: JobStatus) -> Result<()>;

    fn list_jobs(&self, filter: &JobFilter, page: PageRequest) -> Result<Paged<Job>>;

    fn count_jobs_by_status(&self, status: JobStatus) -> Result<usize>;

    /// Active jobs sharing at least one skill with `skill_ids`.
    fn list_active_jobs_with_skills(&self, skill_ids: &[i64]) -> Result<Vec<Job>>;

    /// Deactivates every active job whose HIRED resume count reached its quantity.
    fn deactivate_fully_staffed_jobs(&self) -> Result<usize>;
}

pub trait ResumeStore: Send + Sync {
    fn create_resume(&self, resume: &NewResume) -> Result<i64>;

    /// Returns the resume with user, job and company names resolved.
    fn get_resume(&self, id: i64) -> Result<Option<Resume>>;

    fn set_resume_status(&self, id: i64, status: ResumeStatus, updated_by: &str) -> Result<()>;

    /// Returns false if the resume does not exist.
    fn set_resume_active(&self, id: i64, active: bool) -> Result<bool>;

    /// True if the user already applied to the job, including withdrawn applications.
    fn resume_exists(&self, user_id: i64, job_id: i64) -> Result<bool>;

    fn count_resumes(&self, job_id: i64, status: ResumeStatus) -> Result<usize>;

    /// Lists active resumes, newest first.
    fn list_resumes(&self, filter: &ResumeFilter, page: PageRequest) -> Result<Paged<Resume>>;
}

pub trait SubscriberStore: Send + Sync {
    fn create_subscriber(&self, name: &str, email: &str, skill_ids: &[i64]) -> Result<i64>;
    fn get_subscriber(&self, id: i64) -> Result<Option<Subscriber>>;
    fn get_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>>;
    /// Replaces the name and skill set. Returns false if the subscriber does not exist.
    fn update_subscriber(&self, id: i64, name: &str, skill_ids: &[i64]) -> Result<bool>;
    fn delete_subscriber(&self, id: i64) -> Result<bool>;
    fn list_subscribers(&self) -> Result<Vec<Subscriber>>;
}

pub trait NotificationStore: Send + Sync {
    fn create_notification(
        &self,
        user_id: i64,
        notification: &NewNotification,
    ) -> Result<Notification>;

    /// Unread notifications of a user, newest first.
    fn list_unread_notifications(&self, user_id: i64) -> Result<Vec<Notification>>;

    fn mark_all_notifications_read(&self, user_id: i64) -> Result<usize>;
}

pub trait StatsStore: Send + Sync {
    fn overview_stats(&self) -> Result<OverviewStats>;

    /// New jobs and users per calendar month, for `from <= created_at < to`.
    fn time_series_stats(&self, from: i64, to: i64) -> Result<TimeSeriesStats>;

    fn company_stats(&self, company_id: i64) -> Result<CompanyStats>;
}

/// Soft delete and restore with cascades. Every operation runs in a single
/// transaction and returns false when the root entity does not exist.
pub trait Cascades: Send + Sync {
    /// Deactivates a job and its active resumes.
    fn delete_job(&self, id: i64) -> Result<bool>;

    /// Reactivates a job and its resumes.
    fn restore_job(&self, id: i64) -> Result<bool>;

    /// Deactivates a company, its jobs, their resumes and the company users.
    fn delete_company(&self, id: i64) -> Result<bool>;

    /// Reverses [`Cascades::delete_company`].
    fn restore_company(&self, id: i64) -> Result<bool>;

    /// Deactivates a user and their resumes. When the last active recruiter of
    /// a company is deleted the company cascade runs too.
    fn delete_user(&self, id: i64) -> Result<bool>;

    /// Reactivates a user and their resumes, restoring an inactive company.
    fn restore_user(&self, id: i64) -> Result<bool>;

    /// Deactivates active jobs ending before `now` and their PENDING resumes.
    /// Returns (jobs, resumes) deactivated.
    fn expire_jobs(&self, now: i64) -> Result<(usize, usize)>;
}

pub trait FullStore:
    UserStore
    + CompanyStore
    + SkillStore
    + JobStore
    + ResumeStore
    + SubscriberStore
    + NotificationStore
    + StatsStore
    + Cascades
{
}

impl<
        T: UserStore
            + CompanyStore
            + SkillStore
            + JobStore
            + ResumeStore
            + SubscriberStore
            + NotificationStore
            + StatsStore
            + Cascades,
    > FullStore for T
{
}
