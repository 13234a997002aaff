use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::{fmt::Debug, path::PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobhunter_server::auth::{GoogleTokenVerifier, JwksGoogleVerifier, TokenService};
use jobhunter_server::background_jobs::create_scheduler;
use jobhunter_server::background_jobs::jobs::{
    ExpiredJobsJob, HiredQuotaJob, StateCleanupJob, SubscriberDigestJob,
};
use jobhunter_server::config::{self, AppConfig, FileConfig};
use jobhunter_server::email::{EmailSender, HttpEmailSender, LogEmailSender};
use jobhunter_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig, ServerState};
use jobhunter_server::server_store::{ServerStore, SqliteServerStore};
use jobhunter_server::services::AppServices;
use jobhunter_server::storage::{CloudinaryStorage, FileStorage, LocalFileStorage};
use jobhunter_server::store::{FullStore, SqliteStore};

const DEFAULT_EMAIL_TIMEOUT_SEC: u64 = 10;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing database files (jobhunter.db, server.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Directory for uploaded files when no cloud storage is configured.
    #[clap(long, value_parser = parse_path)]
    pub upload_dir: Option<PathBuf>,

    /// Base URL of the web frontend, used for links in emails.
    #[clap(long)]
    pub frontend_base_url: Option<String>,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            upload_dir: args.upload_dir.clone(),
            frontend_base_url: args.frontend_base_url.clone(),
        }
    }
}

fn make_email_sender(app_config: &AppConfig) -> Result<Arc<dyn EmailSender>> {
    match &app_config.email {
        Some(email) => {
            info!("Sending email through {}", email.api_url);
            Ok(Arc::new(HttpEmailSender::new(
                email.api_url.clone(),
                email.api_key.clone(),
                email.from.clone(),
                email.timeout_sec.unwrap_or(DEFAULT_EMAIL_TIMEOUT_SEC),
            )?))
        }
        None => {
            info!("No email provider configured, emails will only be logged");
            Ok(Arc::new(LogEmailSender))
        }
    }
}

/// Returns the storage backend and whether uploads must be served locally.
fn make_file_storage(app_config: &AppConfig) -> Result<(Arc<dyn FileStorage>, bool)> {
    match &app_config.storage {
        Some(storage) => {
            info!("Uploading files to Cloudinary cloud {}", storage.cloud_name);
            Ok((
                Arc::new(CloudinaryStorage::new(
                    storage.cloud_name.clone(),
                    storage.api_key.clone(),
                    storage.api_secret.clone(),
                )?),
                false,
            ))
        }
        None => {
            std::fs::create_dir_all(&app_config.upload_dir)?;
            info!("Storing uploads in {:?}", app_config.upload_dir);
            let public_base = format!("http://localhost:{}/storage", app_config.port);
            Ok((
                Arc::new(LocalFileStorage::new(
                    app_config.upload_dir.clone(),
                    &public_base,
                )),
                true,
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&config::CliConfig::from(&cli_args), file_config)?;

    info!("Opening store at {:?}", app_config.store_db_path());
    let store: Arc<dyn FullStore> = Arc::new(SqliteStore::new(app_config.store_db_path())?);
    let server_store: Arc<dyn ServerStore> =
        Arc::new(SqliteServerStore::new(app_config.server_db_path())?);

    metrics::init_metrics();

    let email_sender = make_email_sender(&app_config)?;
    let (file_storage, serve_uploads) = make_file_storage(&app_config)?;

    let google_verifier: Option<Arc<dyn GoogleTokenVerifier>> = match &app_config.google {
        Some(google) => Some(Arc::new(JwksGoogleVerifier::new(
            google.client_id.clone(),
            google.jwks_url.clone(),
        )?)),
        None => {
            info!("Google sign-in is disabled");
            None
        }
    };

    let services = AppServices::new(
        store,
        server_store.clone(),
        email_sender,
        &app_config.frontend_base_url,
    );

    if let Some(admin) = &app_config.admin {
        services.user_manager.ensure_admin(&admin.email, &admin.password)?;
    }

    let token_service = Arc::new(TokenService::new(
        &app_config.jwt.secret,
        app_config.jwt.access_token_validity_secs,
        app_config.jwt.refresh_token_validity_secs,
    ));

    let shutdown_token = CancellationToken::new();
    let (mut scheduler, scheduler_handle) = create_scheduler(
        server_store,
        shutdown_token.clone(),
        services.job_context(shutdown_token.clone()),
    );

    let jobs_settings = &app_config.background_jobs;
    let scheduler_handle = if jobs_settings.enabled {
        scheduler
            .register_job(Arc::new(ExpiredJobsJob::new(
                jobs_settings.expired_jobs_cron.clone(),
            )))
            .await;
        scheduler
            .register_job(Arc::new(HiredQuotaJob::new(
                jobs_settings.hired_quota_cron.clone(),
            )))
            .await;
        scheduler
            .register_job(Arc::new(SubscriberDigestJob::new(
                jobs_settings.subscriber_digest_cron.clone(),
            )))
            .await;
        scheduler.register_job(Arc::new(StateCleanupJob)).await;
        info!(
            "Job scheduler initialized with {} job(s)",
            scheduler.job_count().await
        );
        Some(scheduler_handle)
    } else {
        info!("Background jobs are disabled");
        None
    };

    let server_config = ServerConfig::from_app_config(&app_config, serve_uploads);
    let state = ServerState::new(
        server_config,
        &services,
        token_service,
        google_verifier,
        file_storage,
        scheduler_handle,
    );

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);

    // Run HTTP server and job scheduler concurrently
    tokio::select! {
        result = run_server(state) => {
            if let Err(e) = &result {
                error!("HTTP server stopped: {:?}", e);
            }
            shutdown_token.cancel();
            result
        },
        _ = scheduler.run() => {
            info!("Scheduler stopped");
            Ok(())
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            shutdown_token.cancel();
            // Give the scheduler a moment to shut down gracefully
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        }
    }
}
