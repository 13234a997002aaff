use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use super::api::{ApiResult, PageQuery};
use super::session::Session;
use super::state::{GuardedCompanyManager, GuardedJobManager, ServerState};
use crate::company::UpdateCompanyRequest;
use crate::store::{Company, CompanyDraft, CompanyFilter, Job, Paged};
use crate::user::Permission;

async fn create_company(
    session: Session,
    State(company_manager): State<GuardedCompanyManager>,
    Json(body): Json<CompanyDraft>,
) -> ApiResult<impl IntoResponse> {
    session.require(Permission::ManageCompanies)?;
    let company = company_manager.create_company(body)?;
    Ok((StatusCode::CREATED, Json(company)))
}

async fn list_companies(
    State(company_manager): State<GuardedCompanyManager>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<CompanyFilter>,
) -> ApiResult<Json<Paged<Company>>> {
    Ok(Json(company_manager.list_companies(&filter, page.into())?))
}

async fn update_company(
    session: Session,
    State(company_manager): State<GuardedCompanyManager>,
    Json(body): Json<UpdateCompanyRequest>,
) -> ApiResult<Json<Company>> {
    Ok(Json(company_manager.update_company(body, &session.actor())?))
}

async fn get_company(
    State(company_manager): State<GuardedCompanyManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Company>> {
    Ok(Json(company_manager.get_company(id)?))
}

async fn delete_company(
    session: Session,
    State(company_manager): State<GuardedCompanyManager>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    session.require(Permission::ManageCompanies)?;
    company_manager.delete_company(id)?;
    Ok(StatusCode::OK)
}

async fn restore_company(
    session: Session,
    State(company_manager): State<GuardedCompanyManager>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Company>> {
    session.require(Permission::ManageCompanies)?;
    Ok(Json(company_manager.restore_company(id)?))
}

async fn get_company_jobs(
    session: Session,
    State(job_manager): State<GuardedJobManager>,
    Path(id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Paged<Job>>> {
    let actor = session.actor();
    Ok(Json(job_manager.list_company_jobs(id, Some(&actor), page.into())?))
}

pub fn company_routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/",
            get(list_companies).post(create_company).put(update_company),
        )
        .route("/{id}", get(get_company).delete(delete_company))
        .route("/{id}/restore", put(restore_company))
        .route("/{id}/jobs", get(get_company_jobs))
}
