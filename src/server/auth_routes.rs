//! Authentication routes: password and Google sign-in, refresh token
//! rotation, self-registration.

use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::api::ApiResult;
use super::metrics;
use super::session::Session;
use super::state::{GuardedUserManager, ServerState};
use super::ServerConfig;
use crate::error::HiringError;
use crate::store::{Gender, User};
use crate::user::{CreateUserRequest, RegisterRecruiterRequest, UserRole};

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct GoogleLoginBody {
    #[serde(default)]
    credential: Option<String>,
}

/// Account summary returned on sign-in and by `/auth/account`.
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub company_id: Option<i64>,
    pub avatar: Option<String>,
    pub cv: Option<String>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub age: Option<i64>,
}

impl From<User> for LoginUser {
    fn from(user: User) -> Self {
        LoginUser {
            company_id: user.company_id(),
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            avatar: user.avatar,
            cv: user.cv,
            gender: user.gender,
            address: user.address,
            age: user.age,
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    access_token: String,
    user: LoginUser,
}

#[derive(Debug, Serialize)]
struct AccountResponse {
    user: LoginUser,
}

// =============================================================================
// Helpers
// =============================================================================

fn refresh_cookie(config: &ServerConfig, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, value))
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Signs a fresh token pair, stores the refresh token on the user and sets
/// it as a cookie.
fn issue_tokens(
    state: &ServerState,
    user: User,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let access_token = state.token_service.create_access_token(&user)?;
    let refresh_token = state.token_service.create_refresh_token(&user)?;
    state
        .user_manager
        .store_refresh_token(user.id, Some(&refresh_token))?;

    let cookie = refresh_cookie(
        &state.config,
        refresh_token,
        state.config.refresh_token_validity_secs,
    );
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            access_token,
            user: user.into(),
        }),
    ))
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let start = Instant::now();
    let result = state
        .user_manager
        .verify_credentials(&body.username, &body.password);
    let status = if result.is_ok() { "success" } else { "failure" };
    metrics::record_login_attempt("password", status, start.elapsed());

    let user = result?;
    info!("User {} logged in", user.id);
    issue_tokens(&state, user, jar)
}

async fn google_login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(body): Json<GoogleLoginBody>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let credential = body
        .credential
        .filter(|c| !c.is_empty())
        .ok_or_else(|| HiringError::InvalidRequest("ID token must not be empty".to_string()))?;
    let verifier = state.google_verifier.clone().ok_or_else(|| {
        HiringError::InvalidRequest("Google sign-in is not enabled".to_string())
    })?;

    let start = Instant::now();
    let result = match verifier.verify(&credential).await {
        Ok(identity) => state.user_manager.find_or_create_google_user(
            &identity.email,
            &identity.name,
            identity.picture.as_deref(),
        ),
        Err(err) => Err(err),
    };
    let status = if result.is_ok() { "success" } else { "failure" };
    metrics::record_login_attempt("google", status, start.elapsed());

    let user = result?;
    info!("User {} logged in with Google", user.id);
    issue_tokens(&state, user, jar)
}

async fn get_account(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> ApiResult<Json<AccountResponse>> {
    let user = user_manager.get_user(session.user_id)?;
    Ok(Json(AccountResponse { user: user.into() }))
}

async fn refresh(
    State(state): State<ServerState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let token = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HiringError::InvalidRequest("No refresh token cookie".to_string()))?;

    let claims = state.token_service.decode_refresh_token(&token).map_err(|e| {
        debug!("Rejected refresh token: {:#}", e);
        HiringError::Unauthorized("Invalid refresh token".to_string())
    })?;
    let user = state.user_manager.user_for_refresh_token(&token, &claims.sub)?;
    issue_tokens(&state, user, jar)
}

async fn logout(
    session: Session,
    State(state): State<ServerState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, StatusCode)> {
    state.user_manager.store_refresh_token(session.user_id, None)?;
    let expired = refresh_cookie(&state.config, String::new(), 0);
    info!("User {} logged out", session.user_id);
    Ok((jar.add(expired), StatusCode::OK))
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = user_manager.register(body)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn register_recruiter(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<RegisterRecruiterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = user_manager.register_recruiter(body)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub fn auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(login))
        .route("/oauth2-login", post(google_login))
        .route("/account", get(get_account))
        .route("/refresh", get(refresh))
        .route("/logout", post(logout))
        .route("/register", post(register))
        .route("/register-recruiter", post(register_recruiter))
}
