//! Comment endpoints
//!
//! Public:
//! - GET  /api/public/comments?slug=
//! - POST /api/public/comments
//!
//! Admin:
//! - GET    /api/admin/comments?page&limit&status
//! - DELETE /api/admin/comments        `{ids}`
//! - PATCH  /api/admin/comments        `{ids, status?, body?}`

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::parse_id;
use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{CommentPage, CreateCommentInput, PublicComment};

#[derive(Debug, Deserialize)]
pub struct PublicCommentsQuery {
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminCommentsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCommentsRequest {
    pub ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct ModerateCommentsRequest {
    pub ids: Option<Vec<i64>>,
    pub status: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentsResponse {
    pub comments: Vec<PublicComment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub comment: PublicComment,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub success: bool,
    pub updated: u64,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/comments", get(list_thread).post(create_comment))
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route(
        "/comments",
        get(list_comments).delete(delete_comments).patch(moderate_comments),
    )
}

async fn list_thread(
    State(state): State<AppState>,
    Query(query): Query<PublicCommentsQuery>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let comments = state.comment_service.list_public(query.slug.as_deref()).await?;
    Ok(Json(CommentsResponse { comments }))
}

async fn create_comment(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateCommentInput>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let comment = state.comment_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse { comment })))
}

async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<AdminCommentsQuery>,
) -> Result<Json<CommentPage>, ApiError> {
    let page = state
        .comment_service
        .list_admin(
            query.status.as_deref(),
            parse_id(query.page.as_deref()),
            parse_id(query.limit.as_deref()),
        )
        .await?;
    Ok(Json(page))
}

async fn delete_comments(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DeleteCommentsRequest>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted = state.comment_service.delete_many(body.ids.as_deref()).await?;
    Ok(Json(DeletedResponse {
        success: true,
        deleted,
    }))
}

async fn moderate_comments(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ModerateCommentsRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let updated = state
        .comment_service
        .moderate(body.ids.as_deref(), body.status.as_deref(), body.body.as_deref())
        .await?;
    Ok(Json(UpdatedResponse {
        success: true,
        updated,
    }))
}
