//! Analytics endpoints
//!
//! - GET  /api/admin/analytics?days=7|30|90
//! - POST /api/public/stats  `{contentId, event: "view" | "click"}`

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::parse_id;
use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::AnalyticsOverview;

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    pub days: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatEventRequest {
    pub content_id: Option<i64>,
    pub event: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/analytics", get(overview))
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/stats", post(record_event))
}

async fn overview(
    State(state): State<AppState>,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<AnalyticsOverview>, ApiError> {
    let days = parse_id(query.days.as_deref());
    Ok(Json(state.analytics_service.overview(days).await?))
}

async fn record_event(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<StatEventRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .analytics_service
        .record_public_event(body.content_id, body.event.as_deref())
        .await?;
    Ok(Json(OkResponse { ok: true }))
}
