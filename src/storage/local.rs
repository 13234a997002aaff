use super::FileStorage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Writes uploads under `root/{folder}/` and serves them below `public_base`.
pub struct LocalFileStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(
        &self,
        folder: &str,
        public_id: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let dir = self.root.join(folder);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {:?}", dir))?;

        let file_name = format!("{}.{}", public_id, extension);
        let path = dir.join(&file_name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {:?}", path))?;

        Ok(format!(
            "{}/{}/{}",
            self.public_base,
            folder,
            urlencoding::encode(&file_name)
        ))
    }
}
