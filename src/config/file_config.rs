use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub upload_dir: Option<String>,
    pub frontend_base_url: Option<String>,
    pub cors_origins: Option<Vec<String>>,

    pub jwt: Option<JwtConfig>,
    pub google: Option<GoogleConfig>,
    pub email: Option<EmailConfig>,
    pub storage: Option<StorageConfig>,
    pub admin: Option<AdminConfig>,
    pub background_jobs: Option<BackgroundJobsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct JwtConfig {
    /// Base64-encoded HMAC secret.
    pub secret: Option<String>,
    pub access_token_validity_secs: Option<i64>,
    pub refresh_token_validity_secs: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    #[serde(default)]
    pub jwks_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    #[serde(default)]
    pub timeout_sec: Option<u64>,
}

/// Cloudinary credentials. Without them uploads are kept on local disk.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct BackgroundJobsConfig {
    pub enabled: Option<bool>,
    pub expired_jobs_cron: Option<String>,
    pub hired_quota_cron: Option<String>,
    pub subscriber_digest_cron: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections() {
        let config: FileConfig = toml::from_str(
            r#"
            port = 8080
            frontend_base_url = "https://jobs.example.com/"

            [jwt]
            secret = "c2VjcmV0"
            access_token_validity_secs = 600

            [google]
            client_id = "abc.apps.googleusercontent.com"

            [email]
            api_url = "https://api.mailer.example/emails"
            api_key = "key"
            from = "Jobs <no-reply@example.com>"

            [admin]
            email = "admin@example.com"
            password = "123456"

            [background_jobs]
            subscriber_digest_cron = "0 0 8 * * *"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, Some(8080));
        let jwt = config.jwt.unwrap();
        assert_eq!(jwt.secret.as_deref(), Some("c2VjcmV0"));
        assert_eq!(jwt.access_token_validity_secs, Some(600));
        assert!(jwt.refresh_token_validity_secs.is_none());
        assert_eq!(
            config.google.unwrap().client_id,
            "abc.apps.googleusercontent.com"
        );
        assert!(config.email.unwrap().timeout_sec.is_none());
        assert!(config.storage.is_none());
        assert_eq!(config.admin.unwrap().email, "admin@example.com");
        assert_eq!(
            config.background_jobs.unwrap().subscriber_digest_cron.as_deref(),
            Some("0 0 8 * * *")
        );
    }
}
