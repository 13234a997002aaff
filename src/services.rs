//! Wiring of the domain managers shared by the HTTP server and the
//! background scheduler.

use crate::background_jobs::JobContext;
use crate::company::CompanyManager;
use crate::email::{EmailSender, EmailService};
use crate::job::{JobManager, SkillManager};
use crate::notifications::NotificationService;
use crate::resume::ResumeManager;
use crate::server::websocket::ConnectionManager;
use crate::server_store::ServerStore;
use crate::store::FullStore;
use crate::subscriber::SubscriberManager;
use crate::user::UserManager;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn FullStore>,
    pub server_store: Arc<dyn ServerStore>,
    pub connection_manager: Arc<ConnectionManager>,
    pub notification_service: Arc<NotificationService>,
    pub user_manager: Arc<UserManager>,
    pub company_manager: Arc<CompanyManager>,
    pub job_manager: Arc<JobManager>,
    pub skill_manager: Arc<SkillManager>,
    pub resume_manager: Arc<ResumeManager>,
    pub subscriber_manager: Arc<SubscriberManager>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn FullStore>,
        server_store: Arc<dyn ServerStore>,
        email_sender: Arc<dyn EmailSender>,
        frontend_base_url: &str,
    ) -> Self {
        let connection_manager = Arc::new(ConnectionManager::new());
        let notification_service = Arc::new(NotificationService::new(
            store.clone(),
            connection_manager.clone(),
        ));
        let email = EmailService::new(email_sender);

        Self {
            user_manager: Arc::new(UserManager::new(store.clone())),
            company_manager: Arc::new(CompanyManager::new(store.clone())),
            job_manager: Arc::new(JobManager::new(store.clone())),
            skill_manager: Arc::new(SkillManager::new(store.clone())),
            resume_manager: Arc::new(ResumeManager::new(
                store.clone(),
                notification_service.clone(),
                email.clone(),
                frontend_base_url,
            )),
            subscriber_manager: Arc::new(SubscriberManager::new(
                store.clone(),
                server_store.clone(),
                email,
            )),
            store,
            server_store,
            connection_manager,
            notification_service,
        }
    }

    pub fn job_context(&self, cancellation_token: CancellationToken) -> JobContext {
        JobContext::new(
            cancellation_token,
            self.job_manager.clone(),
            self.subscriber_manager.clone(),
            self.server_store.clone(),
        )
    }
}
