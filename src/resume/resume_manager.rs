use crate::email::EmailService;
use crate::error::{HiringError, HiringResult};
use crate::notifications::{NewNotification, NotificationService};
use crate::store::{FullStore, NewResume, PageRequest, Paged, Resume, ResumeFilter, ResumeStatus};
use crate::user::{Actor, Permission};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const FULLY_STAFFED_MESSAGE: &str = "Job is fully staffed";

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyRequest {
    pub job_id: i64,
    pub url: String,
    /// Contact email, defaults to the account email.
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a status change.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    #[serde(flatten)]
    pub resume: Resume,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn notification_message(status: ResumeStatus, job_name: &str) -> String {
    match status {
        ResumeStatus::Approved => format!("You have been invited to interview for {}", job_name),
        ResumeStatus::Rejected => format!("Your application for {} was rejected", job_name),
        ResumeStatus::Passed => format!(
            "Congratulations! You passed the interview for {}",
            job_name
        ),
        ResumeStatus::Failed => format!("You did not pass the interview for {}", job_name),
        ResumeStatus::Hired => format!("Congratulations! You have been hired as {}", job_name),
        other => format!(
            "Your application for {} is now {}",
            job_name,
            other.as_str()
        ),
    }
}

pub struct ResumeManager {
    store: Arc<dyn FullStore>,
    notifications: Arc<NotificationService>,
    email: EmailService,
    frontend_base_url: String,
}

impl ResumeManager {
    pub fn new(
        store: Arc<dyn FullStore>,
        notifications: Arc<NotificationService>,
        email: EmailService,
        frontend_base_url: &str,
    ) -> Self {
        let mut frontend_base_url = frontend_base_url.to_string();
        if !frontend_base_url.ends_with('/') {
            frontend_base_url.push('/');
        }
        Self {
            store,
            notifications,
            email,
            frontend_base_url,
        }
    }

    fn load(&self, id: i64) -> HiringResult<Resume> {
        self.store
            .get_resume(id)?
            .ok_or_else(|| HiringError::not_found("Resume", id))
    }

    /// Platform reviewers handle every resume, recruiters those of their company.
    fn may_review(actor: &Actor, resume: &Resume) -> bool {
        actor.has_permission(Permission::ReviewResumes)
            && (actor.has_permission(Permission::ApproveJobs) || actor.works_for(resume.company_id))
    }

    fn ensure_access(actor: &Actor, resume: &Resume) -> HiringResult<()> {
        if resume.user.id == actor.user_id || Self::may_review(actor, resume) {
            Ok(())
        } else {
            Err(HiringError::Forbidden(
                "You cannot access this resume".to_string(),
            ))
        }
    }

    fn confirmation_url(&self, resume_id: i64) -> String {
        format!("{}{}", self.frontend_base_url, resume_id)
    }

    pub fn apply(&self, actor: &Actor, request: ApplyRequest) -> HiringResult<Resume> {
        if request.url.trim().is_empty() {
            return Err(HiringError::InvalidRequest(
                "Resume url must not be empty".to_string(),
            ));
        }
        let user = self
            .store
            .get_user(actor.user_id)?
            .filter(|user| user.active)
            .ok_or_else(|| HiringError::not_found("User", actor.user_id))?;
        let job = self
            .store
            .get_job(request.job_id)?
            .ok_or_else(|| HiringError::not_found("Job", request.job_id))?;
        if !job.active {
            return Err(HiringError::InvalidState(format!(
                "Job {} is no longer accepting applications",
                job.id
            )));
        }
        if self.store.resume_exists(user.id, job.id)? {
            return Err(HiringError::AlreadyExists(format!(
                "You already applied to job {}",
                job.id
            )));
        }

        let email = request
            .email
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| user.email.clone());
        let id = self.store.create_resume(&NewResume {
            email,
            url: request.url,
            user_id: user.id,
            job_id: job.id,
        })?;
        info!("User {} applied to job {} (resume {})", user.id, job.id, id);
        self.load(id)
    }

    /// Moves a resume to `new_status`, enforcing the job's hiring quota, then
    /// emails and notifies the candidate.
    pub async fn update_status(
        &self,
        resume_id: i64,
        new_status: ResumeStatus,
        reviewer: &Actor,
    ) -> HiringResult<StatusUpdate> {
        let resume = self.load(resume_id)?;
        if !resume.active {
            return Err(HiringError::InvalidState(format!(
                "Resume {} has been withdrawn",
                resume_id
            )));
        }
        if !Self::may_review(reviewer, &resume) {
            return Err(HiringError::Forbidden(
                "Resume belongs to another company".to_string(),
            ));
        }
        let job = self
            .store
            .get_job(resume.job.id)?
            .ok_or_else(|| HiringError::not_found("Job", resume.job.id))?;

        if new_status == ResumeStatus::Hired && resume.status != ResumeStatus::Hired {
            let hired = self.store.count_resumes(job.id, ResumeStatus::Hired)?;
            if hired as i64 >= job.quantity {
                return Err(HiringError::QuotaExceeded(format!(
                    "Job {} already hired {} of {} candidates",
                    job.name, hired, job.quantity
                )));
            }
        }

        self.store
            .set_resume_status(resume_id, new_status, &reviewer.email)?;
        info!(
            "Resume {} moved from {} to {} by {}",
            resume_id,
            resume.status.as_str(),
            new_status.as_str(),
            reviewer.email
        );

        let company_name = resume.company_name.clone().unwrap_or_default();
        self.send_status_email(&resume, new_status, &company_name).await;

        let notification = NewNotification {
            notification_type: new_status,
            message: notification_message(new_status, &job.name),
            job_name: Some(job.name.clone()),
            company_name: resume.company_name.clone(),
            resume_id: Some(resume_id),
        };
        if let Err(err) = self.notifications.notify(resume.user.id, notification).await {
            warn!(
                "Failed to notify user {} about resume {}: {:#}",
                resume.user.id, resume_id, err
            );
        }

        let mut message = None;
        if new_status == ResumeStatus::Hired {
            let hired = self.store.count_resumes(job.id, ResumeStatus::Hired)?;
            if hired as i64 == job.quantity {
                message = Some(FULLY_STAFFED_MESSAGE.to_string());
            }
        }

        Ok(StatusUpdate {
            resume: self.load(resume_id)?,
            message,
        })
    }

    /// Failures are logged by the email service and never undo the transition.
    async fn send_status_email(&self, resume: &Resume, status: ResumeStatus, company_name: &str) {
        let to = resume.email.as_str();
        let name = resume.user.name.as_str();
        let job_title = resume.job.name.as_str();
        let _ = match status {
            ResumeStatus::Approved => {
                self.email
                    .send_interview_invitation(
                        to,
                        name,
                        job_title,
                        company_name,
                        &self.confirmation_url(resume.id),
                    )
                    .await
            }
            ResumeStatus::Passed => {
                self.email
                    .send_interview_passed(
                        to,
                        name,
                        job_title,
                        company_name,
                        &self.confirmation_url(resume.id),
                    )
                    .await
            }
            ResumeStatus::Failed => {
                self.email
                    .send_interview_failed(to, name, job_title, company_name)
                    .await
            }
            ResumeStatus::Hired => {
                self.email
                    .send_hired(to, name, job_title, company_name)
                    .await
            }
            _ => Ok(()),
        };
    }

    fn answer_invitation(
        &self,
        resume_id: i64,
        actor: &Actor,
        answer: ResumeStatus,
    ) -> HiringResult<Resume> {
        let resume = self.load(resume_id)?;
        if resume.user.id != actor.user_id {
            return Err(HiringError::Forbidden(
                "Only the applicant can answer an interview invitation".to_string(),
            ));
        }
        if !resume.active || resume.status != ResumeStatus::Approved {
            return Err(HiringError::InvalidState(format!(
                "Resume {} has no pending interview invitation",
                resume_id
            )));
        }
        self.store
            .set_resume_status(resume_id, answer, &actor.email)?;
        info!("Resume {} answered with {}", resume_id, answer.as_str());
        self.load(resume_id)
    }

    pub fn confirm_interview(&self, resume_id: i64, actor: &Actor) -> HiringResult<Resume> {
        self.answer_invitation(resume_id, actor, ResumeStatus::InterviewConfirmed)
    }

    pub fn decline_interview(&self, resume_id: i64, actor: &Actor) -> HiringResult<Resume> {
        self.answer_invitation(resume_id, actor, ResumeStatus::InterviewRejected)
    }

    pub fn delete_resume(&self, resume_id: i64, actor: &Actor) -> HiringResult<()> {
        let resume = self.load(resume_id)?;
        Self::ensure_access(actor, &resume)?;
        self.store.set_resume_active(resume_id, false)?;
        Ok(())
    }

    pub fn restore_resume(&self, resume_id: i64, actor: &Actor) -> HiringResult<Resume> {
        let resume = self.load(resume_id)?;
        Self::ensure_access(actor, &resume)?;
        self.store.set_resume_active(resume_id, true)?;
        self.load(resume_id)
    }

    pub fn get_resume(&self, resume_id: i64, actor: &Actor) -> HiringResult<Resume> {
        let resume = self.load(resume_id)?;
        Self::ensure_access(actor, &resume)?;
        Ok(resume)
    }

    /// Active resumes; recruiters are limited to their own company.
    pub fn list_resumes(
        &self,
        mut filter: ResumeFilter,
        actor: &Actor,
        page: PageRequest,
    ) -> HiringResult<Paged<Resume>> {
        if !actor.has_permission(Permission::ApproveJobs) {
            let company_id = actor.company_id.ok_or_else(|| {
                HiringError::Forbidden("You are not attached to a company".to_string())
            })?;
            filter.company_id = Some(company_id);
        }
        Ok(self.store.list_resumes(&filter, page)?)
    }

    pub fn list_user_resumes(&self, actor: &Actor, page: PageRequest) -> HiringResult<Paged<Resume>> {
        let filter = ResumeFilter {
            user_id: Some(actor.user_id),
            ..Default::default()
        };
        Ok(self.store.list_resumes(&filter, page)?)
    }
}
