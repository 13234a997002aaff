mod file_config;

pub use file_config::{
    AdminConfig, BackgroundJobsConfig, EmailConfig, FileConfig, GoogleConfig, JwtConfig,
    StorageConfig,
};

use crate::auth::{DEFAULT_ACCESS_TOKEN_VALIDITY_SECS, DEFAULT_REFRESH_TOKEN_VALIDITY_SECS};
use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use clap::ValueEnum;
use rand::RngCore;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:5173/";

/// CLI arguments that can be overridden by the TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub upload_dir: Option<PathBuf>,
    pub frontend_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub upload_dir: PathBuf,
    pub frontend_base_url: String,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,

    pub jwt: JwtSettings,
    pub google: Option<GoogleConfig>,
    pub email: Option<EmailConfig>,
    pub storage: Option<StorageConfig>,
    pub admin: Option<AdminConfig>,
    pub background_jobs: BackgroundJobsSettings,
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// Decoded HMAC secret.
    pub secret: Vec<u8>,
    pub access_token_validity_secs: i64,
    pub refresh_token_validity_secs: i64,
}

#[derive(Debug, Clone)]
pub struct BackgroundJobsSettings {
    pub enabled: bool,
    pub expired_jobs_cron: String,
    pub hired_quota_cron: String,
    pub subscriber_digest_cron: String,
}

impl Default for BackgroundJobsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            expired_jobs_cron: "0 0 0 * * *".to_string(),
            hired_quota_cron: "0 */30 * * * *".to_string(),
            subscriber_digest_cron: "0 0 9 * * *".to_string(),
        }
    }
}

fn resolve_jwt(file: Option<JwtConfig>) -> Result<JwtSettings> {
    let file = file.unwrap_or_default();
    let secret = match file.secret {
        Some(encoded) => {
            let secret = STANDARD
                .decode(encoded.trim())
                .context("jwt.secret is not valid base64")?;
            if secret.is_empty() {
                bail!("jwt.secret must not be empty");
            }
            secret
        }
        None => {
            warn!("No jwt.secret configured, tokens will not survive a restart");
            let mut secret = vec![0u8; 64];
            rand::rng().fill_bytes(&mut secret);
            secret
        }
    };

    let access_token_validity_secs = file
        .access_token_validity_secs
        .unwrap_or(DEFAULT_ACCESS_TOKEN_VALIDITY_SECS);
    let refresh_token_validity_secs = file
        .refresh_token_validity_secs
        .unwrap_or(DEFAULT_REFRESH_TOKEN_VALIDITY_SECS);
    if access_token_validity_secs <= 0 || refresh_token_validity_secs <= 0 {
        bail!("Token validity must be positive");
    }

    Ok(JwtSettings {
        secret,
        access_token_validity_secs,
        refresh_token_validity_secs,
    })
}

fn resolve_background_jobs(file: Option<BackgroundJobsConfig>) -> Result<BackgroundJobsSettings> {
    let file = file.unwrap_or_default();
    let defaults = BackgroundJobsSettings::default();
    let settings = BackgroundJobsSettings {
        enabled: file.enabled.unwrap_or(defaults.enabled),
        expired_jobs_cron: file.expired_jobs_cron.unwrap_or(defaults.expired_jobs_cron),
        hired_quota_cron: file.hired_quota_cron.unwrap_or(defaults.hired_quota_cron),
        subscriber_digest_cron: file
            .subscriber_digest_cron
            .unwrap_or(defaults.subscriber_digest_cron),
    };
    for expr in [
        &settings.expired_jobs_cron,
        &settings.hired_quota_cron,
        &settings.subscriber_digest_cron,
    ] {
        cron::Schedule::from_str(expr)
            .map_err(|e| anyhow!("Invalid cron expression '{}': {}", expr, e))?;
    }
    Ok(settings)
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| anyhow!("db_dir must be specified via --db-dir or in config file"))?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let upload_dir = file
            .upload_dir
            .map(PathBuf::from)
            .or_else(|| cli.upload_dir.clone())
            .unwrap_or_else(|| db_dir.join("uploads"));

        let frontend_base_url = file
            .frontend_base_url
            .or_else(|| cli.frontend_base_url.clone())
            .unwrap_or_else(|| DEFAULT_FRONTEND_BASE_URL.to_string());

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            upload_dir,
            frontend_base_url,
            cors_origins: file.cors_origins.unwrap_or_default(),
            jwt: resolve_jwt(file.jwt)?,
            google: file.google,
            email: file.email,
            storage: file.storage,
            admin: file.admin,
            background_jobs: resolve_background_jobs(file.background_jobs)?,
        })
    }

    pub fn store_db_path(&self) -> PathBuf {
        self.db_dir.join("jobhunter.db")
    }

    pub fn server_db_path(&self) -> PathBuf {
        self.db_dir.join("server.db")
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
