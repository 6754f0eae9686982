//! Admin link endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{parse_id, SuccessResponse};
use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::models::{AdminLink, ContentLink, CreateLinkInput, UpdateLinkInput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLinksQuery {
    pub content_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links).post(create_link))
        .route("/links/{id}", get(get_link).put(update_link).delete(delete_link))
}

async fn list_links(
    State(state): State<AppState>,
    Query(query): Query<ListLinksQuery>,
) -> Result<Json<Vec<AdminLink>>, ApiError> {
    let content_id = parse_id(query.content_id.as_deref());
    Ok(Json(state.link_service.list(content_id).await?))
}

async fn create_link(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateLinkInput>,
) -> Result<(StatusCode, Json<ContentLink>), ApiError> {
    let created = state.link_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_link(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ContentLink>, ApiError> {
    Ok(Json(state.link_service.get(id).await?))
}

async fn update_link(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateLinkInput>,
) -> Result<Json<ContentLink>, ApiError> {
    Ok(Json(state.link_service.update(id, input).await?))
}

async fn delete_link(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.link_service.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}
