//! Admin partner endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::api::common::SuccessResponse;
use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::models::{CreatePartnerInput, Partner, PartnerWithLinkCount, UpdatePartnerInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/partners", get(list_partners).post(create_partner))
        .route("/partners/{id}", put(update_partner).delete(delete_partner))
}

/// Each entry carries `linksCount`
async fn list_partners(
    State(state): State<AppState>,
) -> Result<Json<Vec<PartnerWithLinkCount>>, ApiError> {
    Ok(Json(state.partner_service.list().await?))
}

async fn create_partner(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreatePartnerInput>,
) -> Result<(StatusCode, Json<Partner>), ApiError> {
    let created = state.partner_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_partner(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdatePartnerInput>,
) -> Result<Json<Partner>, ApiError> {
    Ok(Json(state.partner_service.update(id, input).await?))
}

async fn delete_partner(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.partner_service.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}
