//! Domain records shared by the stores, managers and HTTP layer.
//!
//! All timestamps are unix seconds.

use crate::user::UserRole;
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResumeStatus {
    Pending,
    Reviewing,
    Approved,
    Rejected,
    InterviewConfirmed,
    InterviewRejected,
    Passed,
    Failed,
    Hired,
}

impl ResumeStatus {
    pub const ALL: [ResumeStatus; 9] = [
        ResumeStatus::Pending,
        ResumeStatus::Reviewing,
        ResumeStatus::Approved,
        ResumeStatus::Rejected,
        ResumeStatus::InterviewConfirmed,
        ResumeStatus::InterviewRejected,
        ResumeStatus::Passed,
        ResumeStatus::Failed,
        ResumeStatus::Hired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResumeStatus::Pending => "PENDING",
            ResumeStatus::Reviewing => "REVIEWING",
            ResumeStatus::Approved => "APPROVED",
            ResumeStatus::Rejected => "REJECTED",
            ResumeStatus::InterviewConfirmed => "INTERVIEW_CONFIRMED",
            ResumeStatus::InterviewRejected => "INTERVIEW_REJECTED",
            ResumeStatus::Passed => "PASSED",
            ResumeStatus::Failed => "FAILED",
            ResumeStatus::Hired => "HIRED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Approved,
    Rejected,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Approved => "APPROVED",
            JobStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(JobStatus::Pending),
            "APPROVED" => Some(JobStatus::Approved),
            "REJECTED" => Some(JobStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobLevel {
    Intern,
    Fresher,
    Junior,
    Middle,
    Senior,
}

impl JobLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            JobLevel::Intern => "INTERN",
            JobLevel::Fresher => "FRESHER",
            JobLevel::Junior => "JUNIOR",
            JobLevel::Middle => "MIDDLE",
            JobLevel::Senior => "SENIOR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INTERN" => Some(JobLevel::Intern),
            "FRESHER" => Some(JobLevel::Fresher),
            "JUNIOR" => Some(JobLevel::Junior),
            "MIDDLE" => Some(JobLevel::Middle),
            "SENIOR" => Some(JobLevel::Senior),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            "OTHER" => Some(Gender::Other),
            _ => None,
        }
    }
}

// =============================================================================
// Companies
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo: Option<String>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub active: Option<bool>,
}

/// Compact company reference embedded in users and jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRef {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub cv: Option<String>,
    pub role: UserRole,
    pub company: Option<CompanyRef>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
}

impl User {
    pub fn company_id(&self) -> Option<i64> {
        self.company.as_ref().map(|c| c.id)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub cv: Option<String>,
    pub role: UserRole,
    pub company_id: Option<i64>,
}

/// Fully resolved profile fields written by [`UserStore::update_user`].
///
/// [`UserStore::update_user`]: crate::store::UserStore::update_user
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub cv: Option<String>,
    pub role: UserRole,
    pub company_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Skills
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Jobs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub salary: f64,
    pub quantity: i64,
    pub level: JobLevel,
    pub description: Option<String>,
    pub start_date: i64,
    pub end_date: i64,
    pub active: bool,
    pub status: JobStatus,
    pub company: Option<CompanyRef>,
    pub skills: Vec<Skill>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub created_by: Option<String>,
}

impl Job {
    pub fn company_id(&self) -> Option<i64> {
        self.company.as_ref().map(|c| c.id)
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company.as_ref().map(|c| c.name.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobDraft {
    pub name: String,
    pub location: String,
    pub salary: f64,
    pub quantity: i64,
    pub level: JobLevel,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: i64,
    pub end_date: i64,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub skill_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    pub name: Option<String>,
    pub location: Option<String>,
    pub level: Option<JobLevel>,
    pub active: Option<bool>,
    pub status: Option<JobStatus>,
    pub company_id: Option<i64>,
    pub skill_id: Option<i64>,
}

// =============================================================================
// Resumes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resume {
    pub id: i64,
    pub email: String,
    pub url: String,
    pub status: ResumeStatus,
    pub active: bool,
    pub user: UserRef,
    pub job: JobRef,
    pub company_id: Option<i64>,
    pub company_name: Option<String>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub email: String,
    pub url: String,
    pub user_id: i64,
    pub job_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeFilter {
    pub status: Option<ResumeStatus>,
    pub job_id: Option<i64>,
    pub company_id: Option<i64>,
    pub email: Option<String>,
    pub user_id: Option<i64>,
}

// =============================================================================
// Subscribers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscriber {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub skills: Vec<Skill>,
    pub created_at: i64,
}

// =============================================================================
// Pagination
// =============================================================================

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;
/// Highest page number honoured; keeps `offset()` well inside an SQLite integer.
pub const MAX_PAGE: usize = 1 << 31;

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: usize,
    pub page_size: usize,
    pub pages: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub meta: PageMeta,
    pub result: Vec<T>,
}

impl<T> Paged<T> {
    pub fn new(request: PageRequest, total: usize, result: Vec<T>) -> Self {
        Self {
            meta: PageMeta {
                page: request.page,
                page_size: request.size,
                pages: total.div_ceil(request.size),
                total,
            },
            result,
        }
    }
}

// =============================================================================
// Dashboard statistics
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyActiveJobs {
    pub company_id: i64,
    pub company_name: String,
    pub active_jobs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewStats {
    pub total_jobs: usize,
    pub total_companies: usize,
    pub total_users: usize,
    pub active_jobs_by_company: Vec<CompanyActiveJobs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesStats {
    pub new_jobs_by_month: Vec<MonthlyCount>,
    pub new_users_by_month: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: ResumeStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResumeCount {
    pub job_id: i64,
    pub job_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeStats {
    pub total_resumes: usize,
    pub by_status: Vec<StatusCount>,
    pub by_job: Vec<JobResumeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyStats {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub resume_stats: ResumeStats,
}
