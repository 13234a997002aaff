use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::api::{ApiResult, PageQuery};
use super::session::Session;
use super::state::{GuardedUserManager, ServerState};
use crate::error::HiringError;
use crate::store::{Paged, User, UserFilter};
use crate::user::{CreateUserRequest, Permission, UpdateUserRequest};

#[derive(Debug, Deserialize)]
struct ChangePasswordBody {
    old_password: String,
    new_password: String,
}

fn ensure_self_or_manager(session: &Session, user_id: i64) -> ApiResult<()> {
    if session.user_id == user_id || session.has_permission(Permission::ManageUsers) {
        Ok(())
    } else {
        Err(HiringError::Forbidden(
            "You can only access your own account".to_string(),
        ))
    }
}

async fn create_user(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    session.require(Permission::ManageUsers)?;
    let user = user_manager.create_user(body)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Json<Paged<User>>> {
    session.require(Permission::ManageUsers)?;
    Ok(Json(user_manager.list_users(&filter, page.into())?))
}

async fn update_user(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    ensure_self_or_manager(&session, body.id)?;
    let can_manage = session.has_permission(Permission::ManageUsers);
    Ok(Json(user_manager.update_user(body, can_manage)?))
}

async fn get_user(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    ensure_self_or_manager(&session, id)?;
    Ok(Json(user_manager.get_user(id)?))
}

async fn delete_user(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    session.require(Permission::ManageUsers)?;
    user_manager.delete_user(id)?;
    Ok(StatusCode::OK)
}

async fn restore_user(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    session.require(Permission::ManageUsers)?;
    Ok(Json(user_manager.restore_user(id)?))
}

async fn change_password(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<ChangePasswordBody>,
) -> ApiResult<StatusCode> {
    user_manager.change_password(session.user_id, &body.old_password, &body.new_password)?;
    Ok(StatusCode::OK)
}

pub fn user_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_users).post(create_user).put(update_user))
        .route("/change-password", post(change_password))
        .route("/{id}", get(get_user).delete(delete_user))
        .route("/{id}/restore", put(restore_user))
}
