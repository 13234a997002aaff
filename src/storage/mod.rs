//! Uploaded files (CVs, logos, avatars).
//!
//! Uploads are validated here and then handed to a [`FileStorage`]: the
//! Cloudinary image host when configured, the local upload directory otherwise.

mod cloudinary;
mod local;

pub use cloudinary::CloudinaryStorage;
pub use local::LocalFileStorage;

use crate::error::{HiringError, HiringResult};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "doc", "docx"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub url: String,
    pub uploaded_at: i64,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `bytes` under `folder` and returns its public URL.
    ///
    /// `public_id` is unique per upload; `extension` is lowercase and allowed.
    async fn store(
        &self,
        folder: &str,
        public_id: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<String>;
}

/// Lowercase extension of `file_name`, if it is one we accept.
fn allowed_extension(file_name: &str) -> Option<String> {
    let (_, extension) = file_name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// `{uuid}_{basename}` where basename is the file name up to its first dot.
pub fn public_id(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .split('.')
        .next()
        .unwrap_or_default();
    let base: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}", uuid::Uuid::new_v4(), base)
}

fn validate_folder(folder: &str) -> HiringResult<()> {
    let valid = !folder.is_empty()
        && folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(HiringError::InvalidRequest(format!(
            "Invalid folder name: {}",
            folder
        )));
    }
    Ok(())
}

/// Validates an upload and stores it.
pub async fn upload_file(
    storage: &dyn FileStorage,
    folder: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> HiringResult<UploadedFile> {
    if bytes.is_empty() {
        return Err(HiringError::InvalidRequest(
            "File is empty. Please upload a file".to_string(),
        ));
    }
    let extension = allowed_extension(file_name).ok_or_else(|| {
        HiringError::InvalidRequest(format!(
            "Invalid file extension. Only allows {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;
    validate_folder(folder)?;

    let public_id = public_id(file_name);
    let size = bytes.len();
    let url = storage.store(folder, &public_id, &extension, bytes).await?;
    info!("Stored upload {} ({} bytes) at {}", file_name, size, url);

    Ok(UploadedFile {
        url,
        uploaded_at: chrono::Utc::now().timestamp(),
    })
}
