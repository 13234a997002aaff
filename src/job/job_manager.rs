use crate::error::{HiringError, HiringResult};
use crate::store::{FullStore, Job, JobDraft, JobFilter, JobStatus, PageRequest, Paged};
use crate::user::{Actor, Permission};
use std::sync::Arc;
use tracing::info;

fn validate_draft(draft: &JobDraft) -> HiringResult<()> {
    if draft.name.trim().is_empty() {
        return Err(HiringError::InvalidRequest(
            "Job name must not be empty".to_string(),
        ));
    }
    if draft.quantity < 1 {
        return Err(HiringError::InvalidRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }
    if draft.salary < 0.0 {
        return Err(HiringError::InvalidRequest(
            "Salary must not be negative".to_string(),
        ));
    }
    if draft.end_date < draft.start_date {
        return Err(HiringError::InvalidRequest(
            "End date must not be before start date".to_string(),
        ));
    }
    Ok(())
}

/// Reviewers see every job; recruiters see every job of their own company.
/// Everyone else only sees active, approved postings.
fn sees_unpublished(viewer: Option<&Actor>, company_id: Option<i64>) -> bool {
    viewer.is_some_and(|actor| {
        actor.has_permission(Permission::ApproveJobs) || actor.works_for(company_id)
    })
}

fn is_published(job: &Job) -> bool {
    job.active && job.status == JobStatus::Approved
}

pub struct JobManager {
    store: Arc<dyn FullStore>,
}

impl JobManager {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        Self { store }
    }

    fn load(&self, id: i64) -> HiringResult<Job> {
        self.store
            .get_job(id)?
            .ok_or_else(|| HiringError::not_found("Job", id))
    }

    fn ensure_owner(&self, job: &Job, actor: &Actor) -> HiringResult<()> {
        if actor.has_permission(Permission::ApproveJobs) || actor.works_for(job.company_id()) {
            Ok(())
        } else {
            Err(HiringError::Forbidden(
                "Job belongs to another company".to_string(),
            ))
        }
    }

    fn ensure_company_active(&self, company_id: i64) -> HiringResult<()> {
        match self.store.get_company(company_id)? {
            Some(company) if company.active => Ok(()),
            Some(_) => Err(HiringError::InvalidState(format!(
                "Company {} is inactive",
                company_id
            ))),
            None => Err(HiringError::not_found("Company", company_id)),
        }
    }

    /// Company the job is posted for: a recruiter's own company, or the
    /// requested one for reviewers.
    fn posting_company(&self, requested: Option<i64>, actor: &Actor) -> HiringResult<i64> {
        let company_id = if actor.has_permission(Permission::ApproveJobs) {
            requested.or(actor.company_id)
        } else {
            actor.company_id
        };
        company_id.ok_or_else(|| {
            HiringError::InvalidRequest("A job must belong to a company".to_string())
        })
    }

    pub fn create_job(&self, mut draft: JobDraft, actor: &Actor) -> HiringResult<Job> {
        validate_draft(&draft)?;
        let company_id = self.posting_company(draft.company_id, actor)?;
        self.ensure_company_active(company_id)?;
        draft.company_id = Some(company_id);

        let id = self.store.create_job(&draft, &actor.email)?;
        info!("Created job {} for company {} by {}", id, company_id, actor.email);
        self.load(id)
    }

    pub fn update_job(&self, id: i64, mut draft: JobDraft, actor: &Actor) -> HiringResult<Job> {
        let job = self.load(id)?;
        self.ensure_owner(&job, actor)?;
        validate_draft(&draft)?;

        let company_id = if actor.has_permission(Permission::ApproveJobs) {
            draft.company_id.or(job.company_id())
        } else {
            job.company_id()
        };
        if let Some(company_id) = company_id {
            self.ensure_company_active(company_id)?;
        }
        draft.company_id = company_id;

        self.store.update_job(id, &draft)?;
        self.load(id)
    }

    pub fn delete_job(&self, id: i64, actor: &Actor) -> HiringResult<()> {
        let job = self.load(id)?;
        self.ensure_owner(&job, actor)?;
        self.store.delete_job(id)?;
        info!("Soft-deleted job {}", id);
        Ok(())
    }

    pub fn restore_job(&self, id: i64, actor: &Actor) -> HiringResult<Job> {
        let job = self.load(id)?;
        self.ensure_owner(&job, actor)?;
        self.store.restore_job(id)?;
        info!("Restored job {}", id);
        self.load(id)
    }

    /// Unpublished jobs read as missing for viewers who may not see them.
    pub fn get_job(&self, id: i64, viewer: Option<&Actor>) -> HiringResult<Job> {
        let job = self.load(id)?;
        if !is_published(&job) && !sees_unpublished(viewer, job.company_id()) {
            return Err(HiringError::not_found("Job", id));
        }
        Ok(job)
    }

    pub fn list_jobs(
        &self,
        mut filter: JobFilter,
        viewer: Option<&Actor>,
        page: PageRequest,
    ) -> HiringResult<Paged<Job>> {
        if !sees_unpublished(viewer, filter.company_id) {
            filter.active = Some(true);
            filter.status = Some(JobStatus::Approved);
        }
        Ok(self.store.list_jobs(&filter, page)?)
    }

    pub fn list_company_jobs(
        &self,
        company_id: i64,
        viewer: Option<&Actor>,
        page: PageRequest,
    ) -> HiringResult<Paged<Job>> {
        if self.store.get_company(company_id)?.is_none() {
            return Err(HiringError::not_found("Company", company_id));
        }
        let filter = JobFilter {
            company_id: Some(company_id),
            ..Default::default()
        };
        self.list_jobs(filter, viewer, page)
    }

    fn review(&self, id: i64, status: JobStatus) -> HiringResult<Job> {
        let job = self.load(id)?;
        if job.status != JobStatus::Pending {
            return Err(HiringError::InvalidState(format!(
                "Job {} is {} and can no longer be reviewed",
                id,
                job.status.as_str()
            )));
        }
        self.store.set_job_status(id, status)?;
        info!("Job {} is now {}", id, status.as_str());
        self.load(id)
    }

    pub fn approve_job(&self, id: i64) -> HiringResult<Job> {
        self.review(id, JobStatus::Approved)
    }

    pub fn reject_job(&self, id: i64) -> HiringResult<Job> {
        self.review(id, JobStatus::Rejected)
    }

    pub fn count_pending(&self) -> HiringResult<usize> {
        Ok(self.store.count_jobs_by_status(JobStatus::Pending)?)
    }

    /// Deactivates jobs whose end date passed, along with their pending
    /// resumes. Returns (jobs, resumes) deactivated.
    pub fn deactivate_expired_jobs(&self, now: i64) -> HiringResult<(usize, usize)> {
        let (jobs, resumes) = self.store.expire_jobs(now)?;
        if jobs > 0 {
            info!(
                "Deactivated {} expired jobs and {} pending resumes",
                jobs, resumes
            );
        }
        Ok((jobs, resumes))
    }

    /// Closes active jobs whose hired count reached their quantity.
    pub fn deactivate_fully_staffed_jobs(&self) -> HiringResult<usize> {
        let closed = self.store.deactivate_fully_staffed_jobs()?;
        if closed > 0 {
            info!("Closed {} fully staffed jobs", closed);
        }
        Ok(closed)
    }
}
