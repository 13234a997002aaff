//! Jobhunter Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod auth;
pub mod background_jobs;
pub mod company;
pub mod config;
pub mod email;
pub mod error;
pub mod job;
pub mod notifications;
pub mod resume;
pub mod server;
pub mod server_store;
pub mod services;
pub mod sqlite_persistence;
pub mod storage;
pub mod store;
pub mod subscriber;
pub mod user;

// Re-export commonly used types for convenience
pub use error::{HiringError, HiringResult};
pub use server::{run_server, RequestsLoggingLevel};
pub use server_store::{ServerStore, SqliteServerStore};
pub use services::AppServices;
pub use store::{FullStore, SqliteStore};
