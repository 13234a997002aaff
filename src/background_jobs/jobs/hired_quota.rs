use crate::background_jobs::{BackgroundJob, JobContext, JobError, JobOutcome, JobSchedule};
use async_trait::async_trait;

/// Closes jobs that hired as many candidates as they were posted for.
pub struct HiredQuotaJob {
    cron: String,
}

impl HiredQuotaJob {
    pub fn new(cron: impl Into<String>) -> Self {
        Self { cron: cron.into() }
    }
}

impl Default for HiredQuotaJob {
    fn default() -> Self {
        Self::new("0 */30 * * * *")
    }
}

#[async_trait]
impl BackgroundJob for HiredQuotaJob {
    fn id(&self) -> &'static str {
        "hired_quota"
    }

    fn name(&self) -> &'static str {
        "Hired Quota"
    }

    fn description(&self) -> &'static str {
        "Deactivate jobs whose hired count reached the posted quantity"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::Cron(self.cron.clone())
    }

    async fn execute(&self, ctx: &JobContext) -> Result<JobOutcome, JobError> {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        let closed = ctx.job_manager.deactivate_fully_staffed_jobs()?;
        Ok(JobOutcome::new(
            closed,
            format!("Closed {} fully staffed jobs", closed),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background_jobs::scheduler::testing::job_context;
    use crate::store::{
        CompanyDraft, CompanyStore, JobDraft, JobLevel, JobStore, NewResume, NewUser,
        ResumeStatus, ResumeStore, UserStore,
    };
    use crate::user::UserRole;
    use chrono::Utc;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn closes_job_once_quota_is_hired() {
        let temp_dir = TempDir::new().unwrap();
        let (ctx, store, _) = job_context(&temp_dir, CancellationToken::new());
        let company_id = store
            .create_company(&CompanyDraft {
                name: "Acme".to_string(),
                ..Default::default()
            })
            .unwrap();
        let now = Utc::now().timestamp();
        let job_id = store
            .create_job(
                &JobDraft {
                    name: "Rust Dev".to_string(),
                    location: "Hanoi".to_string(),
                    salary: 1000.0,
                    quantity: 1,
                    level: JobLevel::Junior,
                    description: None,
                    start_date: now,
                    end_date: now + 86_400,
                    company_id: Some(company_id),
                    skill_ids: vec![],
                },
                "t",
            )
            .unwrap();

        let outcome = HiredQuotaJob::default().execute(&ctx).await.unwrap();
        assert_eq!(outcome.affected, 0);
        assert!(store.get_job(job_id).unwrap().unwrap().active);

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
                job_id,
            })
            .unwrap();
        store
            .set_resume_status(resume_id, ResumeStatus::Hired, "hr@acme.com")
            .unwrap();

        let outcome = HiredQuotaJob::default().execute(&ctx).await.unwrap();
        assert_eq!(outcome.summary, "Closed 1 fully staffed jobs");
        assert!(!store.get_job(job_id).unwrap().unwrap().active);
    }
}
