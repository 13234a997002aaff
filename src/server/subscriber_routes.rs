use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};

use super::api::ApiResult;
use super::session::Session;
use super::state::{GuardedSubscriberManager, ServerState};
use crate::store::Subscriber;
use crate::subscriber::{SubscriberDraft, UpdateSubscriberRequest};

async fn create_subscriber(
    _session: Session,
    State(subscriber_manager): State<GuardedSubscriberManager>,
    Json(body): Json<SubscriberDraft>,
) -> ApiResult<impl IntoResponse> {
    let subscriber = subscriber_manager.create_subscriber(body)?;
    Ok((StatusCode::CREATED, Json(subscriber)))
}

async fn update_subscriber(
    session: Session,
    State(subscriber_manager): State<GuardedSubscriberManager>,
    Json(body): Json<UpdateSubscriberRequest>,
) -> ApiResult<Json<Subscriber>> {
    Ok(Json(
        subscriber_manager.update_subscriber(body, &session.actor())?,
    ))
}

/// The subscription registered under the caller's email.
async fn get_own_subscription(
    session: Session,
    State(subscriber_manager): State<GuardedSubscriberManager>,
) -> ApiResult<Json<Subscriber>> {
    Ok(Json(
        subscriber_manager.get_subscriber_by_email(&session.email)?,
    ))
}

async fn delete_subscriber(
    session: Session,
    State(subscriber_manager): State<GuardedSubscriberManager>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    subscriber_manager.delete_subscriber(id, &session.actor())?;
    Ok(StatusCode::OK)
}

pub fn subscriber_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(create_subscriber).put(update_subscriber))
        .route("/skills", post(get_own_subscription))
        .route("/{id}", delete(delete_subscriber))
}
