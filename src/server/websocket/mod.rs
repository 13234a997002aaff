//! Real-time push channel. Authenticated clients connect to `/ws` and receive
//! their notifications as they are created.

pub mod connection;
pub mod handler;
pub mod messages;

pub use connection::ConnectionManager;
pub use handler::ws_handler;
pub use messages::{ErrorCode, ServerMessage};
