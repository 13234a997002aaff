mod admin_routes;
pub mod api;
mod auth_routes;
mod company_routes;
pub mod config;
mod file_routes;
mod http_layers;
mod job_routes;
pub mod metrics;
mod notification_routes;
mod resume_routes;
pub mod server;
pub mod session;
mod skill_routes;
pub mod state;
mod stats_routes;
mod subscriber_routes;
mod user_routes;
pub mod websocket;

pub use auth_routes::REFRESH_TOKEN_COOKIE;
pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use state::ServerState;
