//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type and conversions from service errors
//! - Admin session authentication
//! - Request extractors that report malformed input as 400

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, FromRequest, FromRequestParts, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::Cache;
use crate::config::{AdminConfig, Config};
use crate::db::repositories::{
    SqlxAdRepository, SqlxAdminRepository, SqlxBookmarkRepository, SqlxCategoryRepository,
    SqlxCommentRepository, SqlxContentRepository, SqlxLinkRepository, SqlxPartnerRepository,
    SqlxReportRepository, SqlxSessionRepository, SqlxSettingsRepository, SqlxStatsRepository,
};
use crate::db::DynDatabasePool;
use crate::models::AdminUser;
use crate::pages::PageRenderer;
use crate::services::{
    AdService, AdServiceError, AnalyticsService, AnalyticsServiceError, AuthService,
    AuthServiceError, BookmarkService, BookmarkServiceError, CategoryService,
    CategoryServiceError, CommentService, CommentServiceError, ContentService,
    ContentServiceError, LinkService, LinkServiceError, LoginRateLimiter, PartnerService,
    PartnerServiceError, RedirectService, RedirectServiceError, ReportService,
    ReportServiceError, SettingsService, SettingsServiceError,
};

/// Name of the admin session cookie
pub const SESSION_COOKIE: &str = "admin_session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub admin_config: Arc<AdminConfig>,
    pub auth_service: Arc<AuthService>,
    pub content_service: Arc<ContentService>,
    pub category_service: Arc<CategoryService>,
    pub ad_service: Arc<AdService>,
    pub partner_service: Arc<PartnerService>,
    pub link_service: Arc<LinkService>,
    pub report_service: Arc<ReportService>,
    pub comment_service: Arc<CommentService>,
    pub settings_service: Arc<SettingsService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub bookmark_service: Arc<BookmarkService>,
    pub redirect_service: Arc<RedirectService>,
}

impl AppState {
    /// Wire every repository and service onto one pool and cache
    pub fn new(pool: DynDatabasePool, cache: Arc<Cache>, config: &Config) -> anyhow::Result<Self> {
        let contents = SqlxContentRepository::boxed(pool.clone());
        let links = SqlxLinkRepository::boxed(pool.clone());
        let rate_limiter = Arc::new(LoginRateLimiter::new());

        let analytics_service = Arc::new(AnalyticsService::new(
            SqlxStatsRepository::boxed(pool.clone()),
            contents.clone(),
        ));
        let ad_service = Arc::new(AdService::new(SqlxAdRepository::boxed(pool.clone())));
        let settings_service = Arc::new(SettingsService::new(
            SqlxSettingsRepository::boxed(pool.clone()),
            cache.clone(),
        ));
        let redirect_service = Arc::new(RedirectService::new(
            contents.clone(),
            links.clone(),
            analytics_service.clone(),
            ad_service.clone(),
            settings_service.clone(),
            Arc::new(PageRenderer::new()?),
        ));

        Ok(Self {
            admin_config: Arc::new(config.admin.clone()),
            auth_service: Arc::new(AuthService::new(
                SqlxAdminRepository::boxed(pool.clone()),
                SqlxSessionRepository::boxed(pool.clone()),
                rate_limiter,
                chrono::Duration::days(
                    config.admin.session_ttl_days.clamp(1, crate::config::MAX_SESSION_TTL_DAYS),
                ),
            )),
            content_service: Arc::new(ContentService::new(
                contents.clone(),
                links.clone(),
                analytics_service.clone(),
            )),
            category_service: Arc::new(CategoryService::new(
                SqlxCategoryRepository::boxed(pool.clone()),
                cache,
            )),
            partner_service: Arc::new(PartnerService::new(SqlxPartnerRepository::boxed(pool.clone()))),
            link_service: Arc::new(LinkService::new(
                links,
                contents.clone(),
                SqlxPartnerRepository::boxed(pool.clone()),
            )),
            report_service: Arc::new(ReportService::new(
                SqlxReportRepository::boxed(pool.clone()),
                contents.clone(),
            )),
            comment_service: Arc::new(CommentService::new(
                SqlxCommentRepository::boxed(pool.clone()),
                contents.clone(),
            )),
            bookmark_service: Arc::new(BookmarkService::new(
                SqlxBookmarkRepository::boxed(pool.clone()),
                contents,
            )),
            analytics_service,
            ad_service,
            settings_service,
            redirect_service,
            pool,
        })
    }
}

/// Admin resolved from the session, available to protected handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub AdminUser);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMITED", message)
    }

    /// Log the cause and hide it from the client
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", cause);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::validation_error("Invalid body")
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path parameter: {}", rejection.body_text());
        Self::validation_error("Invalid id")
    }
}

/// `Json` body extractor whose failures are `ApiError`s
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor whose failures are `ApiError`s
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<AuthServiceError> for ApiError {
    fn from(e: AuthServiceError) -> Self {
        match e {
            AuthServiceError::Validation(msg) => Self::validation_error(msg),
            AuthServiceError::InvalidCredentials => Self::unauthorized(e.to_string()),
            AuthServiceError::RateLimited => Self::rate_limited(e.to_string()),
            AuthServiceError::AlreadyInitialized => Self::forbidden(e.to_string()),
            AuthServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<ContentServiceError> for ApiError {
    fn from(e: ContentServiceError) -> Self {
        match e {
            ContentServiceError::Validation(msg) => Self::validation_error(msg),
            ContentServiceError::NotFound => Self::not_found(e.to_string()),
            ContentServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::Validation(msg) => Self::validation_error(msg),
            CategoryServiceError::NotFound(_) => Self::not_found("Category not found"),
            CategoryServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<AdServiceError> for ApiError {
    fn from(e: AdServiceError) -> Self {
        match e {
            AdServiceError::Validation(msg) => Self::validation_error(msg),
            AdServiceError::NotFound => Self::not_found(e.to_string()),
            AdServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<PartnerServiceError> for ApiError {
    fn from(e: PartnerServiceError) -> Self {
        match e {
            PartnerServiceError::Validation(msg) => Self::validation_error(msg),
            PartnerServiceError::NotFound => Self::not_found(e.to_string()),
            PartnerServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<LinkServiceError> for ApiError {
    fn from(e: LinkServiceError) -> Self {
        match e {
            LinkServiceError::Validation(msg) => Self::validation_error(msg),
            LinkServiceError::NotFound(msg) => Self::not_found(msg),
            LinkServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<ReportServiceError> for ApiError {
    fn from(e: ReportServiceError) -> Self {
        match e {
            ReportServiceError::Validation(msg) => Self::validation_error(msg),
            ReportServiceError::NotFound(msg) => Self::not_found(msg),
            ReportServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::Validation(msg) => Self::validation_error(msg),
            CommentServiceError::NotFound(msg) => Self::not_found(msg),
            CommentServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<AnalyticsServiceError> for ApiError {
    fn from(e: AnalyticsServiceError) -> Self {
        match e {
            AnalyticsServiceError::Validation(msg) => Self::validation_error(msg),
            AnalyticsServiceError::NotFound(msg) => Self::not_found(msg),
            AnalyticsServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<BookmarkServiceError> for ApiError {
    fn from(e: BookmarkServiceError) -> Self {
        match e {
            BookmarkServiceError::Validation(msg) => Self::validation_error(msg),
            BookmarkServiceError::NotFound => Self::not_found(e.to_string()),
            BookmarkServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<SettingsServiceError> for ApiError {
    fn from(e: SettingsServiceError) -> Self {
        match e {
            SettingsServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

impl From<RedirectServiceError> for ApiError {
    fn from(e: RedirectServiceError) -> Self {
        match e {
            RedirectServiceError::NotFound => Self::not_found(e.to_string()),
            RedirectServiceError::Internal(e) => Self::internal_error(e),
        }
    }
}

/// Session token from `Authorization: Bearer` or the session cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    let cookie_prefix = format!("{}=", SESSION_COOKIE);
    for cookie_header in headers.get_all(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix(&cookie_prefix) {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// First `x-forwarded-for` entry, else `x-real-ip`
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
}

/// Admin session middleware
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let admin = state
        .auth_service
        .current_admin(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    request.extensions_mut().insert(AuthenticatedAdmin(admin));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_session_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_session_token(&headers).is_none());

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=abc123; other=1"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_session_cookie_name_must_match() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session=abc"));
        assert!(extract_session_token(&headers).is_none());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.2"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.5 , 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.5"));
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ApiError::validation_error("x"), StatusCode::BAD_REQUEST),
            (ApiError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND),
            (ApiError::rate_limited("x"), StatusCode::TOO_MANY_REQUESTS),
            (ApiError::internal_error("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error = ApiError::internal_error("database is on fire");
        assert_eq!(error.error.message, "Internal server error");
    }
}
