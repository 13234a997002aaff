//! Operator routes: background job inspection and manual triggers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::api::{ApiResult, ErrorResponse};
use super::session::Session;
use super::state::{GuardedSubscriberManager, OptionalSchedulerHandle, ServerState};
use crate::background_jobs::{JobError, SchedulerHandle};
use crate::error::HiringError;
use crate::user::Permission;

const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct DigestResponse {
    sent: usize,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn get_scheduler(handle: &OptionalSchedulerHandle) -> Result<&SchedulerHandle, Response> {
    handle.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Background jobs are disabled",
        )
    })
}

async fn list_jobs(
    session: Session,
    State(handle): State<OptionalSchedulerHandle>,
) -> Response {
    if let Err(e) = session.require(Permission::ServerAdmin) {
        return e.into_response();
    }
    let scheduler = match get_scheduler(&handle) {
        Ok(s) => s,
        Err(r) => return r,
    };
    match scheduler.list_jobs().await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => HiringError::Store(e).into_response(),
    }
}

async fn get_job_history(
    session: Session,
    State(handle): State<OptionalSchedulerHandle>,
    Path(job_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    if let Err(e) = session.require(Permission::ServerAdmin) {
        return e.into_response();
    }
    let scheduler = match get_scheduler(&handle) {
        Ok(s) => s,
        Err(r) => return r,
    };
    if !scheduler.job_exists(&job_id).await {
        return error_response(StatusCode::NOT_FOUND, format!("Job {} not found", job_id));
    }
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(100);
    match scheduler.get_job_history(&job_id, limit) {
        Ok(history) => Json(history).into_response(),
        Err(e) => HiringError::Store(e).into_response(),
    }
}

async fn trigger_job(
    session: Session,
    State(handle): State<OptionalSchedulerHandle>,
    Path(job_id): Path<String>,
) -> Response {
    if let Err(e) = session.require(Permission::ServerAdmin) {
        return e.into_response();
    }
    let scheduler = match get_scheduler(&handle) {
        Ok(s) => s,
        Err(r) => return r,
    };
    match scheduler.trigger_job(&job_id).await {
        Ok(()) => {
            info!("Job {} triggered by user {}", job_id, session.user_id);
            StatusCode::ACCEPTED.into_response()
        }
        Err(JobError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, format!("Job {} not found", job_id))
        }
        Err(JobError::AlreadyRunning) => {
            error_response(StatusCode::CONFLICT, format!("Job {} is already running", job_id))
        }
        Err(e) => {
            error!("Failed to trigger job {}: {}", job_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /email - sends the subscriber digest right away.
async fn send_digest_now(
    session: Session,
    State(subscriber_manager): State<GuardedSubscriberManager>,
) -> ApiResult<Json<DigestResponse>> {
    session.require(Permission::ServerAdmin)?;
    let sent = subscriber_manager.send_digest().await?;
    info!("Digest sent to {} subscribers on request of user {}", sent, session.user_id);
    Ok(Json(DigestResponse { sent }))
}

pub fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}/history", get(get_job_history))
        .route("/jobs/{id}/trigger", post(trigger_job))
}

pub fn email_routes() -> Router<ServerState> {
    Router::new().route("/", get(send_digest_now))
}
