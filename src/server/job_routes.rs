//! Job postings and their moderation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::api::{ApiResult, PageQuery};
use super::session::Session;
use super::state::{GuardedJobManager, ServerState};
use crate::store::{Job, JobDraft, JobFilter, Paged};
use crate::user::Permission;

#[derive(Debug, Deserialize)]
struct UpdateJobBody {
    id: i64,
    #[serde(flatten)]
    job: JobDraft,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: usize,
}

async fn create_job(
    session: Session,
    State(job_manager): State<GuardedJobManager>,
    Json(body): Json<JobDraft>,
) -> ApiResult<impl IntoResponse> {
    session.require(Permission::PostJobs)?;
    let job = job_manager.create_job(body, &session.actor())?;
    Ok((StatusCode::CREATED, Json(job)))
}

async fn update_job(
    session: Session,
    State(job_manager): State<GuardedJobManager>,
    Json(body): Json<UpdateJobBody>,
) -> ApiResult<Json<Job>> {
    session.require(Permission::PostJobs)?;
    Ok(Json(job_manager.update_job(body.id, body.job, &session.actor())?))
}

/// Anonymous callers only see approved, active postings.
async fn list_jobs(
    session: Option<Session>,
    State(job_manager): State<GuardedJobManager>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<JobFilter>,
) -> ApiResult<Json<Paged<Job>>> {
    let actor = session.map(|s| s.actor());
    Ok(Json(job_manager.list_jobs(filter, actor.as_ref(), page.into())?))
}

async fn get_job(
    session: Option<Session>,
    State(job_manager): State<GuardedJobManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Job>> {
    let actor = session.map(|s| s.actor());
    Ok(Json(job_manager.get_job(id, actor.as_ref())?))
}

async fn delete_job(
    session: Session,
    State(job_manager): State<GuardedJobManager>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    session.require(Permission::PostJobs)?;
    job_manager.delete_job(id, &session.actor())?;
    Ok(StatusCode::OK)
}

async fn restore_job(
    session: Session,
    State(job_manager): State<GuardedJobManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Job>> {
    session.require(Permission::PostJobs)?;
    Ok(Json(job_manager.restore_job(id, &session.actor())?))
}

async fn approve_job(
    session: Session,
    State(job_manager): State<GuardedJobManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Job>> {
    session.require(Permission::ApproveJobs)?;
    Ok(Json(job_manager.approve_job(id)?))
}

async fn reject_job(
    session: Session,
    State(job_manager): State<GuardedJobManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Job>> {
    session.require(Permission::ApproveJobs)?;
    Ok(Json(job_manager.reject_job(id)?))
}

async fn count_pending(
    session: Session,
    State(job_manager): State<GuardedJobManager>,
) -> ApiResult<Json<CountResponse>> {
    session.require(Permission::ApproveJobs)?;
    Ok(Json(CountResponse {
        count: job_manager.count_pending()?,
    }))
}

pub fn job_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_jobs).post(create_job).put(update_job))
        .route("/count-pending", get(count_pending))
        .route("/{id}", get(get_job).delete(delete_job))
        .route("/{id}/restore", put(restore_job))
        .route("/{id}/approve", put(approve_job))
        .route("/{id}/reject", put(reject_job))
}
