//! Admin ad endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::api::common::SuccessResponse;
use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::models::{Ad, CreateAdInput, UpdateAdInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ads", get(list_ads).post(create_ad))
        .route("/ads/{id}", put(update_ad).delete(delete_ad))
}

async fn list_ads(State(state): State<AppState>) -> Result<Json<Vec<Ad>>, ApiError> {
    Ok(Json(state.ad_service.list().await?))
}

async fn create_ad(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateAdInput>,
) -> Result<(StatusCode, Json<Ad>), ApiError> {
    let created = state.ad_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_ad(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateAdInput>,
) -> Result<Json<Ad>, ApiError> {
    Ok(Json(state.ad_service.update(id, input).await?))
}

async fn delete_ad(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.ad_service.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}
