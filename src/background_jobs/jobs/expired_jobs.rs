//! Closes jobs whose end date has passed.

use crate::background_jobs::{BackgroundJob, JobContext, JobError, JobOutcome, JobSchedule};
use async_trait::async_trait;
use chrono::Utc;

/// Deactivates expired jobs and the PENDING applications still waiting on them.
pub struct ExpiredJobsJob {
    cron: String,
}

impl ExpiredJobsJob {
    pub fn new(cron: impl Into<String>) -> Self {
        Self { cron: cron.into() }
    }
}

impl Default for ExpiredJobsJob {
    fn default() -> Self {
        Self::new("0 0 0 * * *")
    }
}

#[async_trait]
impl BackgroundJob for ExpiredJobsJob {
    fn id(&self) -> &'static str {
        "expired_jobs"
    }

    fn name(&self) -> &'static str {
        "Expired Jobs"
    }

    fn description(&self) -> &'static str {
        "Deactivate jobs past their end date and their pending resumes"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Cron(self.cron.clone())
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobOutcome, JobError> {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        let (jobs, resumes) = ctx
            .job_manager
            .deactivate_expired_jobs(Utc::now().timestamp())?;
        Ok(JobOutcome::new(
            jobs + resumes,
            format!("Closed {} expired jobs and {} pending resumes", jobs, resumes),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background_jobs::scheduler::testing::job_context;
    use crate::store::{
        CompanyDraft, CompanyStore, JobDraft, JobLevel, JobStore, NewResume, NewUser,
        ResumeStore, UserStore,
    };
    use crate::user::UserRole;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn expires_past_jobs_only() {
        let temp_dir = TempDir::new().unwrap();
        let (ctx, store, _) = job_context(&temp_dir, CancellationToken::new());
        let company_id = store
            .create_company(&CompanyDraft {
                name: "Acme".to_string(),
                ..Default::default()
            })
            .unwrap();
        let now = Utc::now().timestamp();
        let draft = |name: &str, end_date: i64| JobDraft {
            name: name.to_string(),
            location: "Hanoi".to_string(),
            salary: 1000.0,
            quantity: 1,
            level: JobLevel::Junior,
            description: None,
            start_date: now - 10 * 86_400,
            end_date,
            company_id: Some(company_id),
            skill_ids: vec![],
        };
        let expired = store.create_job(&draft("Old", now - 86_400), "t").unwrap();
        let open = store.create_job(&draft("New", now + 86_400), "t").unwrap();
        let user_id = store
            .create_user(&NewUser {
                name: "Cand".to_string(),
                email: "cand@example.com".to_string(),
                password_hash: None,
                age: None,
                gender: None,
                address: None,
                avatar: None,
                cv: None,
                role: UserRole::Candidate,
                company_id: None,
            })
            .unwrap();
        let resume_id = store
            .create_resume(&NewResume {
                email: "cand@example.com".to_string(),
                url: "cv.pdf".to_string(),
                user_id,
                job_id: expired,
            })
            .unwrap();

        let outcome = ExpiredJobsJob::default().execute(&ctx).await.unwrap();

        assert_eq!(outcome.affected, 2);

        assert!(!store.get_job(expired).unwrap().unwrap().active);
        assert!(store.get_job(open).unwrap().unwrap().active);
        assert!(!store.get_resume(resume_id).unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let temp_dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let (ctx, _, _) = job_context(&temp_dir, token);
        assert!(matches!(
            ExpiredJobsJob::default().execute(&ctx).await,
            Err(JobError::Cancelled)
        ));
    }
}
