//! Spawns an isolated server per test: fresh databases, upload dir and mailbox.

use super::constants::*;
use async_trait::async_trait;
use jobhunter_server::auth::TokenService;
use jobhunter_server::background_jobs::create_scheduler;
use jobhunter_server::background_jobs::jobs::{ExpiredJobsJob, HiredQuotaJob, SubscriberDigestJob};
use jobhunter_server::email::{EmailMessage, EmailSender};
use jobhunter_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use jobhunter_server::server_store::{ServerStore, SqliteServerStore};
use jobhunter_server::services::AppServices;
use jobhunter_server::storage::LocalFileStorage;
use jobhunter_server::store::{FullStore, SqliteStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Captures outgoing email instead of delivering it.
#[derive(Default)]
pub struct Mailbox {
    sent: Mutex<Vec<EmailMessage>>,
}

impl Mailbox {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == address)
            .collect()
    }
}

#[async_trait]
impl EmailSender for Mailbox {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Running server. Dropping it stops the HTTP loop and the scheduler and
/// removes the temporary directory.
pub struct TestServer {
    /// `http://127.0.0.1:{port}`
    pub base_url: String,
    pub port: u16,
    /// Direct database access for arranging fixtures.
    pub store: Arc<dyn FullStore>,
    pub mailbox: Arc<Mailbox>,

    _temp_dir: TempDir,
    shutdown_token: CancellationToken,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Seeds the admin, starts the scheduler with the platform jobs and
    /// serves on an ephemeral port. Returns once `/` answers; panics on any
    /// setup failure.
    pub async fn spawn() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let store: Arc<dyn FullStore> = Arc::new(
            SqliteStore::new(temp_dir.path().join("jobhunter.db"))
                .expect("Failed to open store"),
        );
        let server_store: Arc<dyn ServerStore> = Arc::new(
            SqliteServerStore::new(temp_dir.path().join("server.db"))
                .expect("Failed to open server store"),
        );
        let mailbox = Arc::new(Mailbox::default());

        let services = AppServices::new(
            store.clone(),
            server_store.clone(),
            mailbox.clone(),
            FRONTEND_BASE_URL,
        );
        services
            .user_manager
            .ensure_admin(ADMIN_EMAIL, ADMIN_PASS)
            .expect("Failed to seed admin");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let upload_dir = temp_dir.path().join("uploads");
        let file_storage = Arc::new(LocalFileStorage::new(
            upload_dir.clone(),
            &format!("{}/storage", base_url),
        ));

        let shutdown_token = CancellationToken::new();
        let (mut scheduler, scheduler_handle) = create_scheduler(
            server_store,
            shutdown_token.clone(),
            services.job_context(shutdown_token.clone()),
        );
        scheduler
            .register_job(Arc::new(ExpiredJobsJob::default()))
            .await;
        scheduler
            .register_job(Arc::new(HiredQuotaJob::default()))
            .await;
        scheduler
            .register_job(Arc::new(SubscriberDigestJob::default()))
            .await;
        tokio::spawn(async move {
            scheduler.run().await;
        });

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            upload_dir: Some(upload_dir),
            // reqwest only sends Secure cookies over https
            secure_cookies: false,
            ..ServerConfig::default()
        };
        let state = ServerState::new(
            config,
            &services,
            Arc::new(TokenService::new(b"e2e-test-secret", 600, 3600)),
            None,
            file_storage,
            Some(scheduler_handle),
        );
        let app = make_app(state);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store,
            mailbox,
            _temp_dir: temp_dir,
            shutdown_token,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Websocket URL authenticated with `access_token`
    pub fn ws_url(&self, access_token: &str) -> String {
        format!("ws://127.0.0.1:{}/ws?token={}", self.port, access_token)
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
