//! Fixed values shared by the end-to-end suites.

/// Seeded at startup by the test server.
pub const ADMIN_EMAIL: &str = "admin@jobhunter.test";
pub const ADMIN_PASS: &str = "admin-secret-1";

/// Every account a test registers uses this password.
pub const TEST_PASS: &str = "hunter-secret-1";

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Upper bound for a pushed websocket frame to arrive.
pub const WS_RECEIVE_TIMEOUT_MS: u64 = 2000;

/// Handed to the server as the frontend URL; email links start with it.
pub const FRONTEND_BASE_URL: &str = "http://frontend.test/confirm/";
