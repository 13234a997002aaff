use crate::email::{DigestJob, EmailService};
use crate::error::{HiringError, HiringResult};
use crate::server_store::ServerStore;
use crate::store::{FullStore, Job, JobStatus, Subscriber};
use crate::user::{Actor, Permission};
use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sent-cache entries live this long after the last digest that touched them.
const SENT_CACHE_DAYS: i64 = 30;

fn sent_cache_key(email: &str) -> String {
    format!("sent_jobs:{}", email)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberDraft {
    pub name: String,
    pub email: String,
    #[serde(default, rename = "skills")]
    pub skill_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubscriberRequest {
    pub id: i64,
    pub name: String,
    #[serde(default, rename = "skills")]
    pub skill_ids: Vec<i64>,
}

fn to_digest_job(job: &Job) -> DigestJob {
    DigestJob {
        name: job.name.clone(),
        salary: job.salary,
        company: job.company_name().unwrap_or_default().to_string(),
        skills: job.skills.iter().map(|s| s.name.clone()).collect(),
    }
}

pub struct SubscriberManager {
    store: Arc<dyn FullStore>,
    server_store: Arc<dyn ServerStore>,
    email: EmailService,
}

impl SubscriberManager {
    pub fn new(
        store: Arc<dyn FullStore>,
        server_store: Arc<dyn ServerStore>,
        email: EmailService,
    ) -> Self {
        Self {
            store,
            server_store,
            email,
        }
    }

    fn load(&self, id: i64) -> HiringResult<Subscriber> {
        self.store
            .get_subscriber(id)?
            .ok_or_else(|| HiringError::not_found("Subscriber", id))
    }

    fn ensure_owner(subscriber: &Subscriber, actor: &Actor, permission: Permission) -> HiringResult<()> {
        if subscriber.email.eq_ignore_ascii_case(&actor.email) || actor.has_permission(permission) {
            Ok(())
        } else {
            Err(HiringError::Forbidden(
                "Subscription belongs to another user".to_string(),
            ))
        }
    }

    pub fn create_subscriber(&self, draft: SubscriberDraft) -> HiringResult<Subscriber> {
        let email = draft.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(HiringError::InvalidRequest(format!(
                "Invalid email address '{}'",
                draft.email
            )));
        }
        let already_subscribed =
            || HiringError::AlreadyExists(format!("Email {} is already subscribed", email));
        if self.store.get_subscriber_by_email(email)?.is_some() {
            return Err(already_subscribed());
        }
        let id = self
            .store
            .create_subscriber(draft.name.trim(), email, &draft.skill_ids)
            .map_err(|e| HiringError::on_write(e, already_subscribed))?;
        info!("New subscriber {} ({})", id, email);
        self.load(id)
    }

    pub fn update_subscriber(
        &self,
        request: UpdateSubscriberRequest,
        actor: &Actor,
    ) -> HiringResult<Subscriber> {
        let subscriber = self.load(request.id)?;
        Self::ensure_owner(&subscriber, actor, Permission::ManageSubscriptions)?;
        self.store
            .update_subscriber(request.id, request.name.trim(), &request.skill_ids)?;
        self.load(request.id)
    }

    pub fn get_subscriber_by_email(&self, email: &str) -> HiringResult<Subscriber> {
        self.store
            .get_subscriber_by_email(email)?
            .ok_or_else(|| HiringError::NotFound(format!("No subscription for {}", email)))
    }

    pub fn delete_subscriber(&self, id: i64, actor: &Actor) -> HiringResult<()> {
        let subscriber = self.load(id)?;
        Self::ensure_owner(&subscriber, actor, Permission::ServerAdmin)?;
        self.store.delete_subscriber(id)?;
        info!("Subscriber {} removed", id);
        Ok(())
    }

    fn sent_job_ids(&self, email: &str) -> BTreeSet<i64> {
        let raw = match self.server_store.get_state(&sent_cache_key(email)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeSet::new(),
            Err(err) => {
                warn!("Failed to read sent-cache for {}: {:#}", email, err);
                return BTreeSet::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!("Discarding corrupt sent-cache for {}: {}", email, err);
            BTreeSet::new()
        })
    }

    fn remember_sent(&self, email: &str, ids: &BTreeSet<i64>) -> Result<()> {
        let value = serde_json::to_string(ids)?;
        let expires_at = Utc::now() + Duration::days(SENT_CACHE_DAYS);
        self.server_store
            .put_state(&sent_cache_key(email), &value, expires_at)
    }

    /// Mails every subscriber the active jobs matching their skills that they
    /// have not been sent yet. Returns the number of emails delivered.
    pub async fn send_digest(&self) -> Result<usize> {
        let subscribers = self.store.list_subscribers()?;
        let mut sent = 0;

        for subscriber in subscribers {
            if subscriber.skills.is_empty() {
                continue;
            }
            let skill_ids: Vec<i64> = subscriber.skills.iter().map(|s| s.id).collect();
            let mut already_sent = self.sent_job_ids(&subscriber.email);
            let jobs: Vec<Job> = self
                .store
                .list_active_jobs_with_skills(&skill_ids)?
                .into_iter()
                .filter(|job| job.status == JobStatus::Approved && !already_sent.contains(&job.id))
                .collect();
            if jobs.is_empty() {
                debug!("Nothing new for subscriber {}", subscriber.email);
                continue;
            }

            let digest: Vec<DigestJob> = jobs.iter().map(to_digest_job).collect();
            if self
                .email
                .send_job_digest(&subscriber.email, &subscriber.name, &digest)
                .await
                .is_err()
            {
                continue;
            }
            sent += 1;

            already_sent.extend(jobs.iter().map(|job| job.id));
            if let Err(err) = self.remember_sent(&subscriber.email, &already_sent) {
                warn!(
                    "Failed to update sent-cache for {}: {:#}",
                    subscriber.email, err
                );
            }
        }

        info!("Job digest sent to {} subscribers", sent);
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::testing::RecordingEmailSender;
    use crate::server_store::SqliteServerStore;
    use crate::store::{
        Cascades, CompanyDraft, CompanyStore, JobDraft, JobLevel, JobStatus, JobStore,
        SkillStore, SqliteStore,
    };
    use crate::user::UserRole;
    use tempfile::TempDir;

    struct Fixture {
        manager: SubscriberManager,
        store: Arc<SqliteStore>,
        server_store: Arc<SqliteServerStore>,
        emails: Arc<RecordingEmailSender>,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(dir.path().join("jobhunter.db")).unwrap());
        let server_store = Arc::new(SqliteServerStore::new(dir.path().join("server.db")).unwrap());
        let emails = Arc::new(RecordingEmailSender::default());
        let manager = SubscriberManager::new(
            store.clone(),
            server_store.clone(),
            EmailService::new(emails.clone()),
        );
        Fixture {
            manager,
            store,
            server_store,
            emails,
            _dir: dir,
        }
    }

    fn add_job(store: &SqliteStore, name: &str, skill_ids: Vec<i64>) -> i64 {
        let company_id = store
            .create_company(&CompanyDraft {
                name: format!("{} Inc", name),
                ..Default::default()
            })
            .unwrap();
        let now = Utc::now().timestamp();
        let id = store
            .create_job(
                &JobDraft {
                    name: name.to_string(),
                    location: "Remote".to_string(),
                    salary: 3000.0,
                    quantity: 1,
                    level: JobLevel::Senior,
                    description: None,
                    start_date: now - 60,
                    end_date: now + 86_400,
                    company_id: Some(company_id),
                    skill_ids,
                },
                "test",
            )
            .unwrap();
        store.set_job_status(id, JobStatus::Approved).unwrap();
        id
    }

    fn subscribe(f: &Fixture, email: &str, skill_ids: Vec<i64>) -> Subscriber {
        f.manager
            .create_subscriber(SubscriberDraft {
                name: "Sub".to_string(),
                email: email.to_string(),
                skill_ids,
            })
            .unwrap()
    }

    #[test]
    fn email_is_unique() {
        let f = fixture();
        subscribe(&f, "s@example.com", vec![]);
        let err = f
            .manager
            .create_subscriber(SubscriberDraft {
                name: "Again".to_string(),
                email: "s@example.com".to_string(),
                skill_ids: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, HiringError::AlreadyExists(_)));
    }

    #[test]
    fn only_owner_or_staff_can_change_subscription() {
        let f = fixture();
        let sub = subscribe(&f, "s@example.com", vec![]);
        let stranger = Actor {
            user_id: 9,
            email: "x@example.com".to_string(),
            role: UserRole::Candidate,
            company_id: None,
        };
        let err = f
            .manager
            .update_subscriber(
                UpdateSubscriberRequest {
                    id: sub.id,
                    name: "Hacked".to_string(),
                    skill_ids: vec![],
                },
                &stranger,
            )
            .unwrap_err();
        assert!(matches!(err, HiringError::Forbidden(_)));

        let owner = Actor {
            email: "s@example.com".to_string(),
            ..stranger
        };
        f.manager.delete_subscriber(sub.id, &owner).unwrap();
        assert!(matches!(
            f.manager.get_subscriber_by_email("s@example.com"),
            Err(HiringError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn digest_skips_jobs_already_sent() {
        let f = fixture();
        let rust = f.store.create_skill("Rust").unwrap();
        let go = f.store.create_skill("Go").unwrap();
        let first = add_job(&f.store, "Rust Dev", vec![rust]);
        add_job(&f.store, "Go Dev", vec![go]);
        subscribe(&f, "s@example.com", vec![rust]);
        subscribe(&f, "noskills@example.com", vec![]);

        assert_eq!(f.manager.send_digest().await.unwrap(), 1);
        let sent = f.emails.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "s@example.com");
        assert!(sent[0].html.contains("Rust Dev"));
        assert!(!sent[0].html.contains("Go Dev"));

        let cached = f.server_store.get_state("sent_jobs:s@example.com").unwrap().unwrap();
        assert_eq!(cached, format!("[{}]", first));

        // Nothing new on the second run.
        assert_eq!(f.manager.send_digest().await.unwrap(), 0);

        let second = add_job(&f.store, "Rust Lead", vec![rust]);
        assert_eq!(f.manager.send_digest().await.unwrap(), 1);
        let sent = f.emails.sent();
        assert!(sent[1].html.contains("Rust Lead"));
        assert!(!sent[1].html.contains("Rust Dev"));
        let cached: Vec<i64> = serde_json::from_str(
            &f.server_store.get_state("sent_jobs:s@example.com").unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(cached, vec![first, second]);
    }

    #[tokio::test]
    async fn digest_only_lists_open_approved_jobs() {
        let f = fixture();
        let rust = f.store.create_skill("Rust").unwrap();
        let open = add_job(&f.store, "Open Role", vec![rust]);
        let pending = add_job(&f.store, "Pending Role", vec![rust]);
        f.store.set_job_status(pending, JobStatus::Pending).unwrap();
        let rejected = add_job(&f.store, "Rejected Role", vec![rust]);
        f.store.set_job_status(rejected, JobStatus::Rejected).unwrap();
        let closed = add_job(&f.store, "Closed Role", vec![rust]);
        assert!(f.store.delete_job(closed).unwrap());
        subscribe(&f, "s@example.com", vec![rust]);

        assert_eq!(f.manager.send_digest().await.unwrap(), 1);
        let html = &f.emails.sent()[0].html;
        assert!(html.contains("Open Role"));
        for hidden in ["Pending Role", "Rejected Role", "Closed Role"] {
            assert!(!html.contains(hidden), "{} leaked into the digest", hidden);
        }
        let cached = f.server_store.get_state("sent_jobs:s@example.com").unwrap().unwrap();
        assert_eq!(cached, format!("[{}]", open));
    }

    #[tokio::test]
    async fn failed_send_leaves_cache_untouched() {
        let f = fixture();
        let rust = f.store.create_skill("Rust").unwrap();
        add_job(&f.store, "Rust Dev", vec![rust]);
        subscribe(&f, "s@example.com", vec![rust]);
        f.emails
            .fail_for
            .lock()
            .unwrap()
            .push("s@example.com".to_string());

        assert_eq!(f.manager.send_digest().await.unwrap(), 0);
        assert!(f.server_store.get_state("sent_jobs:s@example.com").unwrap().is_none());
    }
}
