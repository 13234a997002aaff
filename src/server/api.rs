//! Shared pieces of the JSON API: error bodies and pagination parameters.

use crate::error::HiringError;
use crate::server::metrics;
use crate::store::{PageRequest, DEFAULT_PAGE_SIZE};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler result. Manager errors map onto HTTP statuses.
pub type ApiResult<T> = Result<T, HiringError>;

impl HiringError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HiringError::NotFound(_) => StatusCode::NOT_FOUND,
            HiringError::AlreadyExists(_) => StatusCode::CONFLICT,
            HiringError::InvalidRequest(_)
            | HiringError::InvalidState(_)
            | HiringError::QuotaExceeded(_) => StatusCode::BAD_REQUEST,
            HiringError::Forbidden(_) => StatusCode::FORBIDDEN,
            HiringError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HiringError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HiringError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            HiringError::Store(err) => {
                error!("Internal error: {:#}", err);
                metrics::record_error("store", "api");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub size: Option<usize>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(
            query.page.unwrap_or(1),
            query.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_statuses() {
        let cases = [
            (HiringError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (HiringError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (HiringError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (HiringError::InvalidState("x".into()), StatusCode::BAD_REQUEST),
            (HiringError::QuotaExceeded("x".into()), StatusCode::BAD_REQUEST),
            (HiringError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (HiringError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (
                HiringError::Store(anyhow::anyhow!("disk on fire")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn page_query_defaults_and_clamps() {
        let page: PageRequest = PageQuery::default().into();
        assert_eq!(page, PageRequest::new(1, DEFAULT_PAGE_SIZE));

        let page: PageRequest = PageQuery {
            page: Some(0),
            size: Some(10_000),
        }
        .into();
        assert_eq!(page.page, 1);
        assert_eq!(page.size, crate::store::MAX_PAGE_SIZE);
    }

    #[test]
    fn huge_page_number_is_capped() {
        let page: PageRequest = PageQuery {
            page: Some(usize::MAX),
            size: Some(10),
        }
        .into();
        assert_eq!(page.page, crate::store::MAX_PAGE);
        assert_eq!(page.offset(), (crate::store::MAX_PAGE - 1) * 10);
        assert!(i64::try_from(page.offset()).is_ok());
    }
}
