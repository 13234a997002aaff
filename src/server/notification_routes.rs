use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::api::ApiResult;
use super::session::Session;
use super::state::{GuardedNotificationService, ServerState};
use crate::notifications::Notification;

#[derive(Debug, Serialize)]
struct MarkReadResponse {
    updated: usize,
}

async fn get_unread(
    session: Session,
    State(notifications): State<GuardedNotificationService>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(notifications.unread(session.user_id)?))
}

async fn mark_as_read(
    session: Session,
    State(notifications): State<GuardedNotificationService>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = notifications.mark_all_read(session.user_id)?;
    Ok(Json(MarkReadResponse { updated }))
}

pub fn notification_routes() -> Router<ServerState> {
    Router::new()
        .route("/unread", get(get_unread))
        .route("/mark-as-read", post(mark_as_read))
}
