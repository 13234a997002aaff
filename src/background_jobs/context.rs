use crate::job::JobManager;
use crate::server_store::ServerStore;
use crate::subscriber::SubscriberManager;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared resources handed to every job run.
#[derive(Clone)]
pub struct JobContext {
    pub cancellation_token: CancellationToken,
    pub job_manager: Arc<JobManager>,
    pub subscriber_manager: Arc<SubscriberManager>,
    pub server_store: Arc<dyn ServerStore>,
}

impl JobContext {
    pub fn new(
        cancellation_token: CancellationToken,
        job_manager: Arc<JobManager>,
        subscriber_manager: Arc<SubscriberManager>,
        server_store: Arc<dyn ServerStore>,
    ) -> Self {
        Self {
            cancellation_token,
            job_manager,
            subscriber_manager,
            server_store,
        }
    }

    /// Same resources, different cancellation token.
    pub fn with_token(&self, cancellation_token: CancellationToken) -> Self {
        Self {
            cancellation_token,
            ..self.clone()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
