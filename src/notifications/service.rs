//! Notification service for creating and broadcasting notifications

use std::sync::Arc;
use tracing::debug;

use crate::server::metrics;
use crate::server::websocket::{ConnectionManager, ServerMessage};
use crate::store::FullStore;

use super::models::{NewNotification, Notification};

pub struct NotificationService {
    store: Arc<dyn FullStore>,
    connection_manager: Arc<ConnectionManager>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn FullStore>, connection_manager: Arc<ConnectionManager>) -> Self {
        Self {
            store,
            connection_manager,
        }
    }

    /// Persists a notification, then pushes it to every open socket of the user.
    pub async fn notify(
        &self,
        user_id: i64,
        notification: NewNotification,
    ) -> anyhow::Result<Notification> {
        let notification = self.store.create_notification(user_id, &notification)?;
        metrics::record_notification(notification.notification_type.as_str());

        let failed = self
            .connection_manager
            .broadcast_to_user(user_id, ServerMessage::Notification(notification.clone()))
            .await;

        if !failed.is_empty() {
            debug!(
                "Failed to push notification to {} sockets of user {}",
                failed.len(),
                user_id
            );
        }

        Ok(notification)
    }

    pub fn unread(&self, user_id: i64) -> anyhow::Result<Vec<Notification>> {
        self.store.list_unread_notifications(user_id)
    }

    pub fn mark_all_read(&self, user_id: i64) -> anyhow::Result<usize> {
        self.store.mark_all_notifications_read(user_id)
    }
}
