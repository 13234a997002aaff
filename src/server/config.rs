use super::RequestsLoggingLevel;
use crate::config::AppConfig;
use std::path::PathBuf;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Directory served under `/storage` when uploads are kept locally.
    pub upload_dir: Option<PathBuf>,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Max-Age of the refresh token cookie.
    pub refresh_token_validity_secs: i64,
    /// Set the `Secure` attribute on the refresh token cookie.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8080,
            metrics_port: 9091,
            upload_dir: None,
            cors_origins: Vec::new(),
            refresh_token_validity_secs: crate::auth::DEFAULT_REFRESH_TOKEN_VALIDITY_SECS,
            secure_cookies: true,
        }
    }
}

impl ServerConfig {
    pub fn from_app_config(config: &AppConfig, serve_uploads: bool) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            metrics_port: config.metrics_port,
            upload_dir: serve_uploads.then(|| config.upload_dir.clone()),
            cors_origins: config.cors_origins.clone(),
            refresh_token_validity_secs: config.jwt.refresh_token_validity_secs,
            secure_cookies: true,
        }
    }
}
