//! Notification data models

use crate::store::ResumeStatus;
use serde::{Deserialize, Serialize};

/// A persisted user notification.
///
/// `notification_type` carries the resume status that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: ResumeStatus,
    pub message: String,
    pub job_name: Option<String>,
    pub company_name: Option<String>,
    pub resume_id: Option<i64>,
    pub read: bool,
    pub created_at: i64,
}

/// Notification content before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub notification_type: ResumeStatus,
    pub message: String,
    pub job_name: Option<String>,
    pub company_name: Option<String>,
    pub resume_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_serializes_status_as_type() {
        let notification = Notification {
            id: 7,
            user_id: 3,
            notification_type: ResumeStatus::Approved,
            message: "Your application was approved".to_string(),
            job_name: Some("Backend Engineer".to_string()),
            company_name: Some("Acme".to_string()),
            resume_id: Some(11),
            read: false,
            created_at: 1700000000,
        };

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["notification_type"], "APPROVED");
        assert_eq!(value["resume_id"], 11);
        assert_eq!(value["read"], false);

        let deserialized: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(deserialized, notification);
    }
}
