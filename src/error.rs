use thiserror::Error;

/// Errors returned by the domain managers.
#[derive(Debug, Error)]
pub enum HiringError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type HiringResult<T> = Result<T, HiringError>;

impl HiringError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        HiringError::NotFound(format!("{} {} not found", what, id))
    }

    /// Store failure of an insert or rename: a UNIQUE violation becomes the
    /// `conflict` error, anything else stays a store error.
    pub fn on_write(err: anyhow::Error, conflict: impl FnOnce() -> HiringError) -> Self {
        if crate::store::is_unique_violation(&err) {
            conflict()
        } else {
            HiringError::Store(err)
        }
    }
}
