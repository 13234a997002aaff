//! Dashboard aggregates.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Days, NaiveDate};
use serde::Deserialize;

use super::api::ApiResult;
use super::session::Session;
use super::state::{GuardedCompanyManager, GuardedStore, ServerState};
use crate::error::HiringError;
use crate::store::{CompanyStats, OverviewStats, TimeSeriesStats};
use crate::user::Permission;

#[derive(Debug, Default, Deserialize)]
struct TimeSeriesQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

fn parse_date(value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        HiringError::InvalidRequest(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}

/// Converts the inclusive `[start, end]` day range into `[from, to)` unix
/// seconds. Missing bounds leave the range open on that side.
fn date_range(query: &TimeSeriesQuery) -> ApiResult<(i64, i64)> {
    let from = match query.start_date.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => midnight(parse_date(s)?),
        None => i64::MIN,
    };
    let to = match query.end_date.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => {
            let end = parse_date(s)?;
            end.checked_add_days(Days::new(1))
                .map(midnight)
                .unwrap_or(i64::MAX)
        }
        None => i64::MAX,
    };
    if from >= to {
        return Err(HiringError::InvalidRequest(
            "start_date must not be after end_date".to_string(),
        ));
    }
    Ok((from, to))
}

fn midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

async fn get_overview(
    session: Session,
    State(store): State<GuardedStore>,
) -> ApiResult<Json<OverviewStats>> {
    session.require(Permission::ViewStats)?;
    Ok(Json(store.overview_stats()?))
}

async fn get_time_series(
    session: Session,
    State(store): State<GuardedStore>,
    Query(query): Query<TimeSeriesQuery>,
) -> ApiResult<Json<TimeSeriesStats>> {
    session.require(Permission::ViewStats)?;
    let (from, to) = date_range(&query)?;
    Ok(Json(store.time_series_stats(from, to)?))
}

/// Admins see any company, recruiters only their own.
async fn get_company_stats(
    session: Session,
    State(store): State<GuardedStore>,
    State(company_manager): State<GuardedCompanyManager>,
    Path(company_id): Path<i64>,
) -> ApiResult<Json<CompanyStats>> {
    let own_company = session.has_permission(Permission::ViewCompanyStats)
        && session.company_id == Some(company_id);
    if !own_company {
        session.require(Permission::ViewStats)?;
    }
    company_manager.get_company(company_id)?;
    Ok(Json(store.company_stats(company_id)?))
}

pub fn stats_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(get_overview))
        .route("/time-series", get(get_time_series))
        .route("/company/{id}", get(get_company_stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(start: Option<&str>, end: Option<&str>) -> TimeSeriesQuery {
        TimeSeriesQuery {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn end_date_is_inclusive() {
        let (from, to) = date_range(&query(Some("2024-01-01"), Some("2024-01-31"))).unwrap();
        assert_eq!(from, 1_704_067_200);
        assert_eq!(to, 1_706_745_600);
    }

    #[test]
    fn missing_bounds_are_open() {
        assert_eq!(date_range(&query(None, None)).unwrap(), (i64::MIN, i64::MAX));
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(date_range(&query(Some("01/02/2024"), None)).is_err());
        assert!(date_range(&query(Some("2024-02-01"), Some("2024-01-01"))).is_err());
    }
}
