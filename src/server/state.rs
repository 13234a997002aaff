use axum::extract::FromRef;

use crate::auth::{GoogleTokenVerifier, TokenService};
use crate::background_jobs::SchedulerHandle;
use crate::company::CompanyManager;
use crate::job::{JobManager, SkillManager};
use crate::notifications::NotificationService;
use crate::resume::ResumeManager;
use crate::server_store::ServerStore;
use crate::services::AppServices;
use crate::storage::FileStorage;
use crate::store::FullStore;
use crate::subscriber::SubscriberManager;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::websocket::ConnectionManager;
use super::ServerConfig;

pub type GuardedStore = Arc<dyn FullStore>;
pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedCompanyManager = Arc<CompanyManager>;
pub type GuardedJobManager = Arc<JobManager>;
pub type GuardedSkillManager = Arc<SkillManager>;
pub type GuardedResumeManager = Arc<ResumeManager>;
pub type GuardedSubscriberManager = Arc<SubscriberManager>;
pub type GuardedNotificationService = Arc<NotificationService>;
pub type GuardedTokenService = Arc<TokenService>;
pub type OptionalGoogleVerifier = Option<Arc<dyn GoogleTokenVerifier>>;
pub type GuardedFileStorage = Arc<dyn FileStorage>;
pub type GuardedConnectionManager = Arc<ConnectionManager>;
pub type OptionalSchedulerHandle = Option<SchedulerHandle>;
pub type GuardedServerStore = Arc<dyn ServerStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub store: GuardedStore,
    pub user_manager: GuardedUserManager,
    pub company_manager: GuardedCompanyManager,
    pub job_manager: GuardedJobManager,
    pub skill_manager: GuardedSkillManager,
    pub resume_manager: GuardedResumeManager,
    pub subscriber_manager: GuardedSubscriberManager,
    pub notification_service: GuardedNotificationService,
    pub token_service: GuardedTokenService,
    pub google_verifier: OptionalGoogleVerifier,
    pub file_storage: GuardedFileStorage,
    pub ws_connection_manager: GuardedConnectionManager,
    pub scheduler_handle: OptionalSchedulerHandle,
    pub server_store: GuardedServerStore,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        services: &AppServices,
        token_service: Arc<TokenService>,
        google_verifier: OptionalGoogleVerifier,
        file_storage: Arc<dyn FileStorage>,
        scheduler_handle: OptionalSchedulerHandle,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_string(),
            store: services.store.clone(),
            user_manager: services.user_manager.clone(),
            company_manager: services.company_manager.clone(),
            job_manager: services.job_manager.clone(),
            skill_manager: services.skill_manager.clone(),
            resume_manager: services.resume_manager.clone(),
            subscriber_manager: services.subscriber_manager.clone(),
            notification_service: services.notification_service.clone(),
            token_service,
            google_verifier,
            file_storage,
            ws_connection_manager: services.connection_manager.clone(),
            scheduler_handle,
            server_store: services.server_store.clone(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedCompanyManager {
    fn from_ref(input: &ServerState) -> Self {
        input.company_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedJobManager {
    fn from_ref(input: &ServerState) -> Self {
        input.job_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedSkillManager {
    fn from_ref(input: &ServerState) -> Self {
        input.skill_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedResumeManager {
    fn from_ref(input: &ServerState) -> Self {
        input.resume_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedSubscriberManager {
    fn from_ref(input: &ServerState) -> Self {
        input.subscriber_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedNotificationService {
    fn from_ref(input: &ServerState) -> Self {
        input.notification_service.clone()
    }
}

impl FromRef<ServerState> for GuardedTokenService {
    fn from_ref(input: &ServerState) -> Self {
        input.token_service.clone()
    }
}

impl FromRef<ServerState> for OptionalGoogleVerifier {
    fn from_ref(input: &ServerState) -> Self {
        input.google_verifier.clone()
    }
}

impl FromRef<ServerState> for GuardedFileStorage {
    fn from_ref(input: &ServerState) -> Self {
        input.file_storage.clone()
    }
}

impl FromRef<ServerState> for GuardedConnectionManager {
    fn from_ref(input: &ServerState) -> Self {
        input.ws_connection_manager.clone()
    }
}

impl FromRef<ServerState> for OptionalSchedulerHandle {
    fn from_ref(input: &ServerState) -> Self {
        input.scheduler_handle.clone()
    }
}

impl FromRef<ServerState> for GuardedServerStore {
    fn from_ref(input: &ServerState) -> Self {
        input.server_store.clone()
    }
}
