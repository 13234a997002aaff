use anyhow::Result;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{info, warn};

use super::{
    admin_routes::{admin_routes, email_routes},
    auth_routes::auth_routes,
    company_routes::company_routes,
    file_routes::file_routes,
    job_routes::job_routes,
    log_requests, metrics,
    notification_routes::notification_routes,
    resume_routes::resume_routes,
    skill_routes::skill_routes,
    state::ServerState,
    stats_routes::stats_routes,
    subscriber_routes::subscriber_routes,
    user_routes::user_routes,
    websocket::ws_handler,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub websocket_connections: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        websocket_connections: state.ws_connection_manager.total_connections().await,
    };
    Json(stats)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
            .max_age(Duration::from_secs(600));
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", o);
                None
            }
        })
        .collect();

    // Credentialed CORS cannot use wildcard headers.
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .allow_origin(origins)
        .max_age(Duration::from_secs(600))
}

pub fn make_app(state: ServerState) -> Router {
    let api_routes: Router<ServerState> = Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/companies", company_routes())
        .nest("/skills", skill_routes())
        .nest("/jobs", job_routes())
        .nest("/resumes", resume_routes())
        .nest("/subscribers", subscriber_routes())
        .nest("/files", file_routes())
        .nest("/email", email_routes())
        .nest("/notifications", notification_routes())
        .nest("/stats", stats_routes())
        .nest("/admin", admin_routes())
        .route("/ws", get(ws_handler));

    let mut app: Router<ServerState> = Router::new()
        .route("/", get(home))
        .route("/ws", get(ws_handler))
        .nest("/api/v1", api_routes);

    if let Some(upload_dir) = &state.config.upload_dir {
        app = app.nest_service("/storage", ServeDir::new(upload_dir));
    }

    app.layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

async fn run_metrics_server(port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Metrics server listening on port {}", port);
    Ok(axum::serve(listener, make_metrics_app()).await?)
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    let metrics_port = state.config.metrics_port;
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("HTTP server listening on port {}", port);

    tokio::select! {
        result = axum::serve(listener, app) => Ok(result?),
        result = run_metrics_server(metrics_port) => result,
    }
}
