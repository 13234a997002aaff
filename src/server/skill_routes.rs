use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use super::api::ApiResult;
use super::session::Session;
use super::state::{GuardedSkillManager, ServerState};
use crate::store::Skill;
use crate::user::Permission;

#[derive(Debug, Deserialize)]
struct CreateSkillBody {
    name: String,
}

async fn create_skill(
    session: Session,
    State(skill_manager): State<GuardedSkillManager>,
    Json(body): Json<CreateSkillBody>,
) -> ApiResult<impl IntoResponse> {
    session.require(Permission::ManageSkills)?;
    let skill = skill_manager.create_skill(&body.name)?;
    Ok((StatusCode::CREATED, Json(skill)))
}

async fn update_skill(
    session: Session,
    State(skill_manager): State<GuardedSkillManager>,
    Json(body): Json<Skill>,
) -> ApiResult<Json<Skill>> {
    session.require(Permission::ManageSkills)?;
    Ok(Json(skill_manager.update_skill(body.id, &body.name)?))
}

async fn list_skills(State(skill_manager): State<GuardedSkillManager>) -> ApiResult<Json<Vec<Skill>>> {
    Ok(Json(skill_manager.list_skills()?))
}

async fn delete_skill(
    session: Session,
    State(skill_manager): State<GuardedSkillManager>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    session.require(Permission::ManageSkills)?;
    skill_manager.delete_skill(id)?;
    Ok(StatusCode::OK)
}

pub fn skill_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_skills).post(create_skill).put(update_skill))
        .route("/{id}", delete(delete_skill))
}
