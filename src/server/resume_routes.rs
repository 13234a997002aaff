//! Applications and the hiring workflow.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use super::api::{ApiResult, PageQuery};
use super::session::Session;
use super::state::{GuardedResumeManager, ServerState};
use crate::resume::{ApplyRequest, StatusUpdate};
use crate::store::{Paged, Resume, ResumeFilter, ResumeStatus};
use crate::user::Permission;

#[derive(Debug, Deserialize)]
struct UpdateStatusBody {
    id: i64,
    status: ResumeStatus,
}

async fn apply(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Json(body): Json<ApplyRequest>,
) -> ApiResult<impl IntoResponse> {
    session.require(Permission::ApplyToJobs)?;
    let resume = resume_manager.apply(&session.actor(), body)?;
    Ok((StatusCode::CREATED, Json(resume)))
}

async fn update_status(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Json(body): Json<UpdateStatusBody>,
) -> ApiResult<Json<StatusUpdate>> {
    session.require(Permission::ReviewResumes)?;
    let update = resume_manager
        .update_status(body.id, body.status, &session.actor())
        .await?;
    Ok(Json(update))
}

async fn list_resumes(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ResumeFilter>,
) -> ApiResult<Json<Paged<Resume>>> {
    session.require(Permission::ReviewResumes)?;
    Ok(Json(resume_manager.list_resumes(filter, &session.actor(), page.into())?))
}

async fn list_user_resumes(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Paged<Resume>>> {
    Ok(Json(resume_manager.list_user_resumes(&session.actor(), page.into())?))
}

async fn get_resume(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Resume>> {
    Ok(Json(resume_manager.get_resume(id, &session.actor())?))
}

async fn delete_resume(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    resume_manager.delete_resume(id, &session.actor())?;
    Ok(StatusCode::OK)
}

async fn restore_resume(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Resume>> {
    Ok(Json(resume_manager.restore_resume(id, &session.actor())?))
}

async fn confirm_interview(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Resume>> {
    Ok(Json(resume_manager.confirm_interview(id, &session.actor())?))
}

async fn decline_interview(
    session: Session,
    State(resume_manager): State<GuardedResumeManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Resume>> {
    Ok(Json(resume_manager.decline_interview(id, &session.actor())?))
}

pub fn resume_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_resumes).post(apply).put(update_status))
        .route("/by-user", get(list_user_resumes).post(list_user_resumes))
        .route("/{id}", get(get_resume).delete(delete_resume))
        .route("/{id}/restore", put(restore_resume))
        .route("/{id}/confirm", put(confirm_interview))
        .route("/{id}/decline", put(decline_interview))
}
