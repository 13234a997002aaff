use super::*;
use crate::store::Cascades;
use rusqlite::OptionalExtension;

fn is_active(conn: &Connection, table: &str, id: i64) -> Result<Option<bool>> {
    Ok(conn
        .query_row(
            &format!("SELECT active FROM {} WHERE id = ?1", table),
            params![id],
            |row| row.get(0),
        )
        .optional()?)
}

fn set_job_tree_active(conn: &Connection, job_id: i64, active: bool) -> Result<()> {
    let now = now();
    conn.execute(
        "UPDATE job SET active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active, now, job_id],
    )?;
    conn.execute(
        "UPDATE resume SET active = ?1, updated_at = ?2 WHERE job_id = ?3 AND active != ?1",
        params![active, now, job_id],
    )?;
    Ok(())
}

fn set_company_tree_active(conn: &Connection, company_id: i64, active: bool) -> Result<()> {
    let now = now();
    conn.execute(
        "UPDATE company SET active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active, now, company_id],
    )?;
    conn.execute(
        "UPDATE resume SET active = ?1, updated_at = ?2
         WHERE active != ?1 AND job_id IN (SELECT id FROM job WHERE company_id = ?3)",
        params![active, now, company_id],
    )?;
    conn.execute(
        "UPDATE job SET active = ?1, updated_at = ?2 WHERE company_id = ?3 AND active != ?1",
        params![active, now, company_id],
    )?;
    conn.execute(
        "UPDATE user SET active = ?1, updated_at = ?2 WHERE company_id = ?3 AND active != ?1",
        params![active, now, company_id],
    )?;
    Ok(())
}

fn set_user_tree_active(conn: &Connection, user_id: i64, active: bool) -> Result<()> {
    let now = now();
    conn.execute(
        "UPDATE user SET active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active, now, user_id],
    )?;
    conn.execute(
        "UPDATE resume SET active = ?1, updated_at = ?2 WHERE user_id = ?3 AND active != ?1",
        params![active, now, user_id],
    )?;
    Ok(())
}

impl Cascades for SqliteStore {
    fn delete_job(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if is_active(&tx, "job", id)?.is_none() {
            return Ok(false);
        }
        set_job_tree_active(&tx, id, false)?;
        tx.commit()?;
        Ok(true)
    }

    fn restore_job(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        match is_active(&tx, "job", id)? {
            None => return Ok(false),
            Some(true) => return Ok(true),
            Some(false) => set_job_tree_active(&tx, id, true)?,
        }
        tx.commit()?;
        Ok(true)
    }

    fn delete_company(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if is_active(&tx, "company", id)?.is_none() {
            return Ok(false);
        }
        set_company_tree_active(&tx, id, false)?;
        tx.commit()?;
        Ok(true)
    }

    fn restore_company(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        match is_active(&tx, "company", id)? {
            None => return Ok(false),
            Some(true) => return Ok(true),
            Some(false) => set_company_tree_active(&tx, id, true)?,
        }
        tx.commit()?;
        Ok(true)
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let row: Option<(i32, Option<i64>)> = tx
            .query_row(
                "SELECT role, company_id FROM user WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((role, company_id)) = row else {
            return Ok(false);
        };

        set_user_tree_active(&tx, id, false)?;

        if let (Some(UserRole::Recruiter), Some(company_id)) = (UserRole::from_int(role), company_id)
        {
            let remaining: i64 = tx.query_row(
                "SELECT COUNT(*) FROM user WHERE company_id = ?1 AND role = ?2 AND active = 1",
                params![company_id, UserRole::Recruiter.as_int()],
                |row| row.get(0),
            )?;
            if remaining == 0 {
                set_company_tree_active(&tx, company_id, false)?;
            }
        }

        tx.commit()?;
        Ok(true)
    }

    fn restore_user(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let row: Option<(bool, Option<i64>)> = tx
            .query_row(
                "SELECT active, company_id FROM user WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((active, company_id)) = row else {
            return Ok(false);
        };
        if active {
            return Ok(true);
        }

        set_user_tree_active(&tx, id, true)?;
        if let Some(company_id) = company_id {
            if is_active(&tx, "company", company_id)? == Some(false) {
                set_company_tree_active(&tx, company_id, true)?;
            }
        }

        tx.commit()?;
        Ok(true)
    }

    fn expire_jobs(&self, now: i64) -> Result<(usize, usize)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let updated_at = super::now();
        let resumes = tx.execute(
            "UPDATE resume SET active = 0, updated_at = ?1
             WHERE active = 1 AND status = ?2
               AND job_id IN (SELECT id FROM job WHERE active = 1 AND end_date < ?3)",
            params![updated_at, ResumeStatus::Pending.as_str(), now],
        )?;
        let jobs = tx.execute(
            "UPDATE job SET active = 0, updated_at = ?1 WHERE active = 1 AND end_date < ?2",
            params![updated_at, now],
        )?;
        tx.commit()?;
        Ok((jobs, resumes))
    }
}
