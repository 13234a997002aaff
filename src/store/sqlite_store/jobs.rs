use super::*;
use crate::store::JobStore;
use rusqlite::OptionalExtension;

fn link_job_skills(conn: &Connection, job_id: i64, skill_ids: &[i64]) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO job_skill (job_id, skill_id)
         SELECT ?1, id FROM skill WHERE id = ?2",
    )?;
    for skill_id in skill_ids {
        stmt.execute(params![job_id, skill_id])?;
    }
    Ok(())
}

impl JobStore for SqliteStore {
    fn create_job(&self, job: &JobDraft, created_by: &str) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO job (name, location, salary, quantity, level, description, start_date,
             end_date, status, company_id, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                job.name,
                job.location,
                job.salary,
                job.quantity,
                job.level.as_str(),
                job.description,
                job.start_date,
                job.end_date,
                JobStatus::Pending.as_str(),
                job.company_id,
                created_by
            ],
        )?;
        let job_id = tx.last_insert_rowid();
        link_job_skills(&tx, job_id, &job.skill_ids)?;
        tx.commit()?;
        Ok(job_id)
    }

    fn get_job(&self, id: i64) -> Result<Option<Job>> {
        let conn = self.conn.lock().unwrap();
        let job = conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE j.id = ?1", JOB_SELECT, JOB_FROM),
                params![id],
                row_to_job,
            )
            .optional()?;
        match job {
            Some(mut job) => {
                job.skills = load_job_skills(&conn, job.id)?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    fn update_job(&self, id: i64, job: &JobDraft) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE job SET name = ?1, location = ?2, salary = ?3, quantity = ?4, level = ?5,
             description = ?6, start_date = ?7, end_date = ?8, company_id = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                job.name,
                job.location,
                job.salary,
                job.quantity,
                job.level.as_str(),
                job.description,
                job.start_date,
                job.end_date,
                job.company_id,
                now(),
                id
            ],
        )?;
        if changed == 0 {
            return Ok(false);
        }
        tx.execute("DELETE FROM job_skill WHERE job_id = ?1", params![id])?;
        link_job_skills(&tx, id, &job.skill_ids)?;
        tx.commit()?;
        Ok(true)
    }

    fn set_job_status(&self, id: i64, status: JobStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE job SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now(), id],
        )?;
        Ok(())
    }

    fn list_jobs(&self, filter: &JobFilter, page: PageRequest) -> Result<Paged<Job>> {
        let conn = self.conn.lock().unwrap();
        let mut sql_filter = SqlFilter::default();
        if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
            sql_filter.push_like("j.name", name);
        }
        if let Some(location) = filter.location.as_deref().filter(|s| !s.is_empty()) {
            sql_filter.push_like("j.location", location);
        }
        if let Some(level) = filter.level {
            sql_filter.push("j.level = ?", level.as_str().to_string());
        }
        if let Some(active) = filter.active {
            sql_filter.push("j.active = ?", active);
        }
        if let Some(status) = filter.status {
            sql_filter.push("j.status = ?", status.as_str().to_string());
        }
        if let Some(company_id) = filter.company_id {
            sql_filter.push("j.company_id = ?", company_id);
        }
        if let Some(skill_id) = filter.skill_id {
            sql_filter.push(
                "j.id IN (SELECT job_id FROM job_skill WHERE skill_id = ?)",
                skill_id,
            );
        }

        let mut paged = query_page(
            &conn,
            JOB_SELECT,
            JOB_FROM,
            &sql_filter,
            "j.id DESC",
            page,
            row_to_job,
        )?;
        paged.result = with_job_skills(&conn, paged.result)?;
        Ok(paged)
    }

    fn count_jobs_by_status(&self, status: JobStatus) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM job WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn list_active_jobs_with_skills(&self, skill_ids: &[i64]) -> Result<Vec<Job>> {
        if skill_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; skill_ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE j.active = 1 AND j.id IN
             (SELECT job_id FROM job_skill WHERE skill_id IN ({}))
             ORDER BY j.id DESC",
            JOB_SELECT, JOB_FROM, placeholders
        ))?;
        let jobs = stmt
            .query_map(params_from_iter(skill_ids.iter()), row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        with_job_skills(&conn, jobs)
    }

    fn deactivate_fully_staffed_jobs(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(
            "UPDATE job SET active = 0, updated_at = ?1
             WHERE active = 1 AND quantity <=
               (SELECT COUNT(*) FROM resume r WHERE r.job_id = job.id AND r.status = ?2)",
            params![now(), ResumeStatus::Hired.as_str()],
        )?;
        Ok(count)
    }
}
