//! Harness shared by the end-to-end suites.
//!
//! Each suite spawns its own [`TestServer`] (temporary databases, random port,
//! captured outgoing mail) and talks to it through [`TestClient`]s:
//!
//! ```no_run
//! mod common;
//! use common::{TestClient, TestServer};
//!
//! #[tokio::test]
//! async fn admin_sees_users() {
//!     let server = TestServer::spawn().await;
//!     let admin = TestClient::authenticated_admin(server.base_url.clone()).await;
//!     assert!(admin.get("/users").await.status().is_success());
//! }
//! ```

mod client;
mod constants;
mod server;

#[allow(unused_imports)]
pub use client::{created_id, TestClient};
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use server::{Mailbox, TestServer};
