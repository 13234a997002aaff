use super::*;
use crate::notifications::{NewNotification, Notification};
use crate::store::NotificationStore;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, notification_type, message, job_name, company_name, resume_id, read, created_at";

fn row_to_notification(row: &Row) -> rusqlite::Result<Notification> {
    let notification_type: String = row.get("notification_type")?;
    Ok(Notification {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        notification_type: ResumeStatus::parse(&notification_type)
            .unwrap_or(ResumeStatus::Pending),
        message: row.get("message")?,
        job_name: row.get("job_name")?,
        company_name: row.get("company_name")?,
        resume_id: row.get("resume_id")?,
        read: row.get("read")?,
        created_at: row.get("created_at")?,
    })
}

impl NotificationStore for SqliteStore {
    fn create_notification(
        &self,
        user_id: i64,
        notification: &NewNotification,
    ) -> Result<Notification> {
        let conn = self.conn.lock().unwrap();
        let created_at = now();
        conn.execute(
            "INSERT INTO notification (user_id, notification_type, message, job_name,
             company_name, resume_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                notification.notification_type.as_str(),
                notification.message,
                notification.job_name,
                notification.company_name,
                notification.resume_id,
                created_at
            ],
        )?;
        Ok(Notification {
            id: conn.last_insert_rowid(),
            user_id,
            notification_type: notification.notification_type,
            message: notification.message.clone(),
            job_name: notification.job_name.clone(),
            company_name: notification.company_name.clone(),
            resume_id: notification.resume_id,
            read: false,
            created_at,
        })
    }

    fn list_unread_notifications(&self, user_id: i64) -> Result<Vec<Notification>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notification WHERE user_id = ?1 AND read = 0
             ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        ))?;
        let notifications = stmt
            .query_map(params![user_id], row_to_notification)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notifications)
    }

    fn mark_all_notifications_read(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute(
            "UPDATE notification SET read = 1 WHERE user_id = ?1 AND read = 0",
            params![user_id],
        )?)
    }
}
