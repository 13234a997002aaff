//! SQLite implementation of the domain store traits.

mod cascades;
mod companies;
mod jobs;
mod notifications;
mod resumes;
mod skills;
mod stats;
mod subscribers;
mod users;

use super::models::*;
use super::schema::STORE_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::open_versioned_db;
use crate::user::UserRole;
use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), STORE_VERSIONED_SCHEMAS, "jobhunter")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}

/// WHERE clause builder using anonymous `?` placeholders.
#[derive(Default)]
struct SqlFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl SqlFilter {
    fn push(&mut self, clause: &str, value: impl Into<Value>) {
        self.clauses.push(clause.to_string());
        self.values.push(value.into());
    }

    fn push_like(&mut self, column: &str, needle: &str) {
        self.push(
            &format!("{} LIKE ? ESCAPE '\\'", column),
            format!("%{}%", escape_like(needle)),
        );
    }

    fn push_raw(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Runs a paged query: a COUNT over `from + filter`, then the page itself.
fn query_page<T>(
    conn: &Connection,
    select: &str,
    from: &str,
    filter: &SqlFilter,
    order_by: &str,
    page: PageRequest,
    map: impl FnMut(&Row) -> rusqlite::Result<T>,
) -> Result<Paged<T>> {
    let where_sql = filter.where_sql();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}{}", from, where_sql),
        params_from_iter(filter.values.iter()),
        |row| row.get(0),
    )?;

    let mut values = filter.values.clone();
    values.push(Value::Integer(page.size as i64));
    values.push(Value::Integer(page.offset() as i64));
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT ? OFFSET ?",
        select, from, where_sql, order_by
    ))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), map)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Paged::new(page, total as usize, rows))
}

fn company_ref(row: &Row) -> rusqlite::Result<Option<CompanyRef>> {
    let company_id: Option<i64> = row.get("company_id")?;
    let company_name: Option<String> = row.get("company_name")?;
    Ok(match (company_id, company_name) {
        (Some(id), Some(name)) => Some(CompanyRef {
            id,
            name,
            logo: row.get("company_logo")?,
        }),
        _ => None,
    })
}

// =============================================================================
// Users
// =============================================================================

const USER_SELECT: &str = "u.id, u.name, u.email, u.password_hash, u.age, u.gender, u.address, \
     u.avatar, u.cv, u.role, u.company_id, c.name AS company_name, c.logo AS company_logo, \
     u.refresh_token, u.active, u.created_at, u.updated_at";
const USER_FROM: &str = "user u LEFT JOIN company c ON c.id = u.company_id";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role: i32 = row.get("role")?;
    let gender: Option<String> = row.get("gender")?;
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        age: row.get("age")?,
        gender: gender.as_deref().and_then(Gender::parse),
        address: row.get("address")?,
        avatar: row.get("avatar")?,
        cv: row.get("cv")?,
        role: UserRole::from_int(role).unwrap_or(UserRole::Candidate),
        company: company_ref(row)?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        password_hash: row.get("password_hash")?,
        refresh_token: row.get("refresh_token")?,
    })
}

// =============================================================================
// Companies
// =============================================================================

const COMPANY_COLUMNS: &str =
    "id, name, description, address, logo, active, created_at, updated_at";

fn row_to_company(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        address: row.get("address")?,
        logo: row.get("logo")?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

// =============================================================================
// Jobs
// =============================================================================

const JOB_SELECT: &str = "j.id, j.name, j.location, j.salary, j.quantity, j.level, \
     j.description, j.start_date, j.end_date, j.active, j.status, j.company_id, \
     c.name AS company_name, c.logo AS company_logo, j.created_at, j.updated_at, j.created_by";
const JOB_FROM: &str = "job j LEFT JOIN company c ON c.id = j.company_id";

/// Maps a job row. Skills are loaded separately with [`load_job_skills`].
fn row_to_job(row: &Row) -> rusqlite::Result<Job> {
    let level: String = row.get("level")?;
    let status: String = row.get("status")?;
    Ok(Job {
        id: row.get("id")?,
        name: row.get("name")?,
        location: row.get("location")?,
        salary: row.get("salary")?,
        quantity: row.get("quantity")?,
        level: JobLevel::parse(&level).unwrap_or(JobLevel::Junior),
        description: row.get("description")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        active: row.get("active")?,
        status: JobStatus::parse(&status).unwrap_or(JobStatus::Pending),
        company: company_ref(row)?,
        skills: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        created_by: row.get("created_by")?,
    })
}

fn load_job_skills(conn: &Connection, job_id: i64) -> Result<Vec<Skill>> {
    let mut stmt = conn.prepare_cached(
        "SELECT s.id, s.name FROM job_skill js JOIN skill s ON s.id = js.skill_id
         WHERE js.job_id = ?1 ORDER BY s.name",
    )?;
    let skills = stmt
        .query_map(params![job_id], |row| {
            Ok(Skill {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(skills)
}

fn with_job_skills(conn: &Connection, mut jobs: Vec<Job>) -> Result<Vec<Job>> {
    for job in &mut jobs {
        job.skills = load_job_skills(conn, job.id)?;
    }
    Ok(jobs)
}

// =============================================================================
// Resumes
// =============================================================================

const RESUME_SELECT: &str = "r.id, r.email, r.url, r.status, r.active, r.user_id, \
     u.name AS user_name, r.job_id, j.name AS job_name, j.company_id, c.name AS company_name, \
     r.created_at, r.updated_at, r.updated_by";
const RESUME_FROM: &str = "resume r JOIN user u ON u.id = r.user_id \
     JOIN job j ON j.id = r.job_id LEFT JOIN company c ON c.id = j.company_id";

fn row_to_resume(row: &Row) -> rusqlite::Result<Resume> {
    let status: String = row.get("status")?;
    Ok(Resume {
        id: row.get("id")?,
        email: row.get("email")?,
        url: row.get("url")?,
        status: ResumeStatus::parse(&status).unwrap_or(ResumeStatus::Pending),
        active: row.get("active")?,
        user: UserRef {
            id: row.get("user_id")?,
            name: row.get("user_name")?,
        },
        job: JobRef {
            id: row.get("job_id")?,
            name: row.get("job_name")?,
        },
        company_id: row.get("company_id")?,
        company_name: row.get("company_name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        updated_by: row.get("updated_by")?,
    })
}
