use super::*;
use crate::store::StatsStore;

fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
    let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(count as usize)
}

fn monthly_counts(conn: &Connection, table: &str, from: i64, to: i64) -> Result<Vec<MonthlyCount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT strftime('%Y-%m', created_at, 'unixepoch') AS month, COUNT(*)
         FROM {} WHERE created_at >= ?1 AND created_at < ?2
         GROUP BY month ORDER BY month",
        table
    ))?;
    let counts = stmt
        .query_map(params![from, to], |row| {
            Ok(MonthlyCount {
                month: row.get(0)?,
                count: row.get::<_, i64>(1)? as usize,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(counts)
}

impl StatsStore for SqliteStore {
    fn overview_stats(&self) -> Result<OverviewStats> {
        let conn = self.conn.lock().unwrap();
        let total_jobs = count(&conn, "SELECT COUNT(*) FROM job", [])?;
        let total_companies = count(&conn, "SELECT COUNT(*) FROM company", [])?;
        let total_users = count(&conn, "SELECT COUNT(*) FROM user", [])?;

        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, COUNT(j.id) AS active_jobs
             FROM company c JOIN job j ON j.company_id = c.id AND j.active = 1
             GROUP BY c.id, c.name
             ORDER BY active_jobs DESC, c.name",
        )?;
        let active_jobs_by_company = stmt
            .query_map([], |row| {
                Ok(CompanyActiveJobs {
                    company_id: row.get(0)?,
                    company_name: row.get(1)?,
                    active_jobs: row.get::<_, i64>(2)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(OverviewStats {
            total_jobs,
            total_companies,
            total_users,
            active_jobs_by_company,
        })
    }

    fn time_series_stats(&self, from: i64, to: i64) -> Result<TimeSeriesStats> {
        let conn = self.conn.lock().unwrap();
        Ok(TimeSeriesStats {
            new_jobs_by_month: monthly_counts(&conn, "job", from, to)?,
            new_users_by_month: monthly_counts(&conn, "user", from, to)?,
        })
    }

    fn company_stats(&self, company_id: i64) -> Result<CompanyStats> {
        let conn = self.conn.lock().unwrap();
        let total_jobs = count(
            &conn,
            "SELECT COUNT(*) FROM job WHERE company_id = ?1",
            params![company_id],
        )?;
        let active_jobs = count(
            &conn,
            "SELECT COUNT(*) FROM job WHERE company_id = ?1 AND active = 1",
            params![company_id],
        )?;
        let total_resumes = count(
            &conn,
            "SELECT COUNT(*) FROM resume r JOIN job j ON j.id = r.job_id WHERE j.company_id = ?1",
            params![company_id],
        )?;

        let mut stmt = conn.prepare(
            "SELECT r.status, COUNT(*) FROM resume r JOIN job j ON j.id = r.job_id
             WHERE j.company_id = ?1 GROUP BY r.status",
        )?;
        let mut by_status = stmt
            .query_map(params![company_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter_map(|(status, count)| {
                ResumeStatus::parse(&status).map(|status| StatusCount {
                    status,
                    count: count as usize,
                })
            })
            .collect::<Vec<_>>();
        by_status.sort_by_key(|c| ResumeStatus::ALL.iter().position(|s| *s == c.status));

        let mut stmt = conn.prepare(
            "SELECT j.id, j.name, COUNT(r.id) FROM job j LEFT JOIN resume r ON r.job_id = j.id
             WHERE j.company_id = ?1 GROUP BY j.id, j.name ORDER BY j.id",
        )?;
        let by_job = stmt
            .query_map(params![company_id], |row| {
                Ok(JobResumeCount {
                    job_id: row.get(0)?,
                    job_name: row.get(1)?,
                    count: row.get::<_, i64>(2)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(CompanyStats {
            total_jobs,
            active_jobs,
            resume_stats: ResumeStats {
                total_resumes,
                by_status,
                by_job,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::store::{Cascades, ResumeStore};
    use chrono::TimeZone;

    #[test]
    fn overview_counts_active_jobs_per_company() {
        let (store, _dir) = create_tmp_store();
        let acme = add_company(&store, "Acme");
        let globex = add_company(&store, "Globex");
        add_job(&store, "A1", Some(acme));
        add_job(&store, "A2", Some(acme));
        let g1 = add_job(&store, "G1", Some(globex));
        store.delete_job(g1).unwrap();
        add_user(&store, "u@example.com", UserRole::Candidate, None);

        let stats = store.overview_stats().unwrap();
        assert_eq!(stats.total_jobs, 3);
        assert_eq!(stats.total_companies, 2);
        assert_eq!(stats.total_users, 1);
        assert_eq!(
            stats.active_jobs_by_company,
            vec![CompanyActiveJobs {
                company_id: acme,
                company_name: "Acme".to_string(),
                active_jobs: 2,
            }]
        );
    }

    #[test]
    fn time_series_groups_by_month() {
        let (store, _dir) = create_tmp_store();
        let jan = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap().timestamp();
        let feb = Utc.with_ymd_and_hms(2025, 2, 3, 12, 0, 0).unwrap().timestamp();
        for (name, created_at) in [("a", jan), ("b", jan), ("c", feb)] {
            let id = add_job(&store, name, None);
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "UPDATE job SET created_at = ?1 WHERE id = ?2",
                params![created_at, id],
            )
            .unwrap();
        }

        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().timestamp();
        let to = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap().timestamp();
        let stats = store.time_series_stats(from, to).unwrap();
        assert_eq!(
            stats.new_jobs_by_month,
            vec![
                MonthlyCount {
                    month: "2025-01".to_string(),
                    count: 2
                },
                MonthlyCount {
                    month: "2025-02".to_string(),
                    count: 1
                },
            ]
        );
        assert!(stats.new_users_by_month.is_empty());
    }

    #[test]
    fn company_stats_break_down_resumes() {
        let (store, _dir) = create_tmp_store();
        let acme = add_company(&store, "Acme");
        let j1 = add_job(&store, "J1", Some(acme));
        let j2 = add_job(&store, "J2", Some(acme));
        let u1 = add_user(&store, "u1@example.com", UserRole::Candidate, None);
        let u2 = add_user(&store, "u2@example.com", UserRole::Candidate, None);
        let r1 = apply(&store, u1, j1);
        apply(&store, u2, j1);
        store
            .set_resume_status(r1, ResumeStatus::Approved, "hr")
            .unwrap();

        let stats = store.company_stats(acme).unwrap();
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.active_jobs, 2);
        assert_eq!(stats.resume_stats.total_resumes, 2);
        assert_eq!(
            stats.resume_stats.by_status,
            vec![
                StatusCount {
                    status: ResumeStatus::Pending,
                    count: 1
                },
                StatusCount {
                    status: ResumeStatus::Approved,
                    count: 1
                },
            ]
        );
        assert_eq!(stats.resume_stats.by_job.len(), 2);
        assert_eq!(stats.resume_stats.by_job[0].count, 2);
        assert_eq!(stats.resume_stats.by_job[1].job_id, j2);
        assert_eq!(stats.resume_stats.by_job[1].count, 0);
    }
}
