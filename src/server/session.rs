use super::state::ServerState;
use crate::error::{HiringError, HiringResult};
use crate::user::{Actor, Permission, UserRole};

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Query},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use super::api::ErrorResponse;

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub company_id: Option<i64>,
    pub permissions: Vec<Permission>,
}

impl Session {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Fails with `Forbidden` unless the caller holds `permission`.
    pub fn require(&self, permission: Permission) -> HiringResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(HiringError::Forbidden(format!(
                "Missing permission {:?}",
                permission
            )))
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            email: self.email.clone(),
            role: self.role,
            company_id: self.company_id,
        }
    }
}

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug)]
pub enum SessionExtractionError {
    Unauthorized,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> Response {
        match self {
            SessionExtractionError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Authentication required".to_string(),
                }),
            )
                .into_response(),
            SessionExtractionError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn extract_token_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Websocket clients pass the access token as `?token=`.
fn extract_token_from_query(parts: &Parts) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|v| !v.is_empty())
}

async fn extract_session_from_request_parts(
    parts: &Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, SessionExtractionError> {
    let Some(token) = extract_token_from_headers(parts).or_else(|| extract_token_from_query(parts))
    else {
        debug!("No token in headers nor query.");
        return Ok(None);
    };

    let claims = match ctx.token_service.decode_access_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Rejected access token: {:#}", e);
            return Err(SessionExtractionError::Unauthorized);
        }
    };

    let user = match ctx.user_manager.get_user(claims.user.id) {
        Ok(user) => user,
        Err(HiringError::NotFound(_)) => {
            debug!("Token refers to unknown user {}", claims.user.id);
            return Err(SessionExtractionError::Unauthorized);
        }
        Err(e) => {
            debug!("Failed to load user {}: {}", claims.user.id, e);
            return Err(SessionExtractionError::InternalError);
        }
    };
    if !user.active || user.email != claims.sub {
        debug!("Token of user {} is no longer valid", user.id);
        return Err(SessionExtractionError::Unauthorized);
    }

    Ok(Some(Session {
        user_id: user.id,
        company_id: user.company_id(),
        permissions: user.role.permissions().to_vec(),
        role: user.role,
        email: user.email,
        name: user.name,
    }))
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await?
            .ok_or(SessionExtractionError::Unauthorized)
    }
}

/// Public routes that personalise their output for signed-in callers.
/// An invalid token is still rejected rather than treated as anonymous.
impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}
