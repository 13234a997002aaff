use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::warn;

use super::api::ApiResult;
use super::session::Session;
use super::state::{GuardedFileStorage, ServerState};
use crate::error::HiringError;
use crate::storage::{self, UploadedFile};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// POST /files - multipart form with a `file` part and a `folder` field.
async fn upload_file(
    session: Session,
    State(file_storage): State<GuardedFileStorage>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadedFile>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut folder: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((file_name, bytes.to_vec())),
                    Err(e) => {
                        warn!("Failed to read upload from user {}: {}", session.user_id, e);
                        return Err(HiringError::InvalidRequest(
                            "Failed to read file data".to_string(),
                        ));
                    }
                }
            }
            "folder" => {
                if let Ok(text) = field.text().await {
                    folder = Some(text.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| {
        HiringError::InvalidRequest("File is empty. Please upload a file".to_string())
    })?;
    let folder = folder
        .ok_or_else(|| HiringError::InvalidRequest("Missing folder".to_string()))?;

    let uploaded =
        storage::upload_file(file_storage.as_ref(), &folder, &file_name, bytes).await?;
    Ok(Json(uploaded))
}

pub fn file_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(upload_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
