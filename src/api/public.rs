//! Public catalog endpoints
//!
//! Everything here is read by the public site without a session, except the
//! bookmark toggle, which is keyed by an anonymous visitor id.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{clamp_page, clamp_page_size, parse_id};
use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::models::{
    Ad, BookmarkWithContent, Category, ContentDetail, ContentSort, ContentType, LinkWithPartner,
    PagedContent, PublicContentQuery,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentListQuery {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinksQuery {
    pub content_id: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdsQuery {
    pub position: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarksQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBookmarkRequest {
    pub user_id: Option<String>,
    pub content_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarkToggleResponse {
    pub bookmarked: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/content", get(list_content))
        .route("/content/{slug}", get(content_detail))
        .route("/categories", get(list_categories))
        .route("/links", get(list_links))
        .route("/ads", get(list_ads))
        .route("/bookmarks", get(list_bookmarks).post(toggle_bookmark))
}

/// Only the exact upper-case names are accepted
fn parse_type(raw: Option<&str>) -> Result<ContentType, ApiError> {
    raw.and_then(|v| ContentType::ALL.iter().copied().find(|t| t.as_str() == v))
        .ok_or_else(|| ApiError::validation_error("Invalid type"))
}

async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<PagedContent>, ApiError> {
    let content_type = parse_type(query.content_type.as_deref())?;

    let mut filter = PublicContentQuery::new(content_type)
        .with_sort(ContentSort::parse_or_default(query.sort.as_deref()))
        .with_page(
            clamp_page(query.page.as_deref()),
            clamp_page_size(query.page_size.as_deref()),
        );
    if let Some(category) = query.category.filter(|c| !c.trim().is_empty()) {
        filter = filter.with_category(category.trim());
    }
    if let Some(q) = query.q.filter(|q| !q.trim().is_empty()) {
        filter = filter.with_search(q.trim());
    }

    Ok(Json(state.content_service.list_public(&filter).await?))
}

async fn content_detail(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<ContentDetail>, ApiError> {
    Ok(Json(state.content_service.get_public_detail(&slug).await?))
}

async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoriesQuery>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let content_type = parse_type(query.content_type.as_deref())?;
    Ok(Json(
        state.category_service.list_public_for_type(content_type).await?,
    ))
}

async fn list_links(
    State(state): State<AppState>,
    Query(query): Query<LinksQuery>,
) -> Result<Json<Vec<LinkWithPartner>>, ApiError> {
    let links = state
        .link_service
        .verified_links(parse_id(query.content_id.as_deref()), query.slug.as_deref())
        .await?;
    Ok(Json(links))
}

async fn list_ads(
    State(state): State<AppState>,
    Query(query): Query<AdsQuery>,
) -> Result<Json<Vec<Ad>>, ApiError> {
    let position = query
        .position
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation_error("position is required"))?;

    Ok(Json(
        state
            .ad_service
            .active_for_position(position, chrono::Utc::now())
            .await?,
    ))
}

async fn list_bookmarks(
    State(state): State<AppState>,
    Query(query): Query<BookmarksQuery>,
) -> Result<Json<Vec<BookmarkWithContent>>, ApiError> {
    Ok(Json(
        state.bookmark_service.list(query.user_id.as_deref()).await?,
    ))
}

/// 201 when the bookmark was added, 200 when it was removed
async fn toggle_bookmark(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ToggleBookmarkRequest>,
) -> Result<(StatusCode, Json<BookmarkToggleResponse>), ApiError> {
    let bookmarked = state
        .bookmark_service
        .toggle(body.user_id.as_deref(), body.content_id)
        .await?;
    let status = if bookmarked {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(BookmarkToggleResponse { bookmarked })))
}
