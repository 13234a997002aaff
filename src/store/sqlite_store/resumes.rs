use super::*;
use crate::store::ResumeStore;
use rusqlite::OptionalExtension;

impl ResumeStore for SqliteStore {
    fn create_resume(&self, resume: &NewResume) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO resume (email, url, status, user_id, job_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                resume.email,
                resume.url,
                ResumeStatus::Pending.as_str(),
                resume.user_id,
                resume.job_id
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_resume(&self, id: i64) -> Result<Option<Resume>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE r.id = ?1", RESUME_SELECT, RESUME_FROM),
                params![id],
                row_to_resume,
            )
            .optional()?)
    }

    fn set_resume_status(&self, id: i64, status: ResumeStatus, updated_by: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE resume SET status = ?1, updated_by = ?2, updated_at = ?3 WHERE id = ?4",
            params![status.as_str(), updated_by, now(), id],
        )?;
        Ok(())
    }

    fn set_resume_active(&self, id: i64, active: bool) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE resume SET active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, now(), id],
        )?;
        Ok(changed > 0)
    }

    fn resume_exists(&self, user_id: i64, job_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let exists = conn
            .query_row(
                "SELECT 1 FROM resume WHERE user_id = ?1 AND job_id = ?2",
                params![user_id, job_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    fn count_resumes(&self, job_id: i64, status: ResumeStatus) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM resume WHERE job_id = ?1 AND status = ?2",
            params![job_id, status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn list_resumes(&self, filter: &ResumeFilter, page: PageRequest) -> Result<Paged<Resume>> {
        let conn = self.conn.lock().unwrap();
        let mut sql_filter = SqlFilter::default();
        sql_filter.push_raw("r.active = 1");
        if let Some(status) = filter.status {
            sql_filter.push("r.status = ?", status.as_str().to_string());
        }
        if let Some(job_id) = filter.job_id {
            sql_filter.push("r.job_id = ?", job_id);
        }
        if let Some(company_id) = filter.company_id {
            sql_filter.push("j.company_id = ?", company_id);
        }
        if let Some(user_id) = filter.user_id {
            sql_filter.push("r.user_id = ?", user_id);
        }
        if let Some(email) = filter.email.as_deref().filter(|s| !s.is_empty()) {
            sql_filter.push_like("r.email", email);
        }
        query_page(
            &conn,
            RESUME_SELECT,
            RESUME_FROM,
            &sql_filter,
            "r.id DESC",
            page,
            row_to_resume,
        )
    }
}
