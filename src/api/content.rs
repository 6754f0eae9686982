//! Admin content endpoints
//!
//! - GET    /api/admin/content
//! - POST   /api/admin/content
//! - GET    /api/admin/content/{id}
//! - PUT    /api/admin/content/{id}
//! - DELETE /api/admin/content/{id}

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::api::common::SuccessResponse;
use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::models::{AdminContent, CreateContentInput, UpdateContentInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/content", get(list_content).post(create_content))
        .route(
            "/content/{id}",
            get(get_content).put(update_content).delete(delete_content),
        )
}

/// Newest first, with categories and links
async fn list_content(State(state): State<AppState>) -> Result<Json<Vec<AdminContent>>, ApiError> {
    Ok(Json(state.content_service.list_admin().await?))
}

async fn create_content(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateContentInput>,
) -> Result<(StatusCode, Json<AdminContent>), ApiError> {
    let created = state.content_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_content(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<AdminContent>, ApiError> {
    Ok(Json(state.content_service.get_admin(id).await?))
}

async fn update_content(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateContentInput>,
) -> Result<Json<AdminContent>, ApiError> {
    Ok(Json(state.content_service.update(id, input).await?))
}

async fn delete_content(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.content_service.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}
