//! Report endpoints
//!
//! Visitors file reports publicly; admins list, triage and delete them.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::SuccessResponse;
use crate::api::middleware::{client_ip, ApiError, ApiJson, ApiPath, AppState};
use crate::models::{ContentReport, CreateReportInput, ReportWithContent};

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreatedResponse {
    pub success: bool,
    pub report_id: i64,
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/reports/{id}", put(update_report).delete(delete_report))
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/report", post(create_report))
}

async fn create_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<CreateReportInput>,
) -> Result<(StatusCode, Json<ReportCreatedResponse>), ApiError> {
    let report = state.report_service.create(input, client_ip(&headers)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReportCreatedResponse {
            success: true,
            report_id: report.id,
        }),
    ))
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<Vec<ReportWithContent>>, ApiError> {
    Ok(Json(state.report_service.list(query.status.as_deref()).await?))
}

async fn update_report(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateReportRequest>,
) -> Result<Json<ContentReport>, ApiError> {
    Ok(Json(state.report_service.update_status(id, body.status.as_deref()).await?))
}

async fn delete_report(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.report_service.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}
