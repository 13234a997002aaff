//! User notifications: persisted records pushed live over the websocket.

mod models;
mod service;

pub use models::{NewNotification, Notification};
pub use service::NotificationService;
