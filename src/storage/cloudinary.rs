use super::FileStorage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Signed uploads to the Cloudinary image host.
pub struct CloudinaryStorage {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryStorage {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            cloud_name,
            api_key,
            api_secret,
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/auto/upload", API_BASE, self.cloud_name)
    }
}

/// SHA-256 signature over the alphabetically sorted `key=value` pairs
/// joined with `&`, followed by the API secret.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl FileStorage for CloudinaryStorage {
    async fn store(
        &self,
        folder: &str,
        public_id: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", folder),
                ("public_id", public_id),
                ("timestamp", &timestamp),
            ],
            &self.api_secret,
        );

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(format!("{}.{}", public_id, extension));
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("public_id", public_id.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        debug!("Uploading {} to Cloudinary folder {}", public_id, folder);
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .context("Failed to reach Cloudinary")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Cloudinary upload failed with {}: {}", status, body);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .context("Failed to parse Cloudinary response")?;
        Ok(uploaded.secure_url)
    }
}
