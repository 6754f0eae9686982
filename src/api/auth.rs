//! Admin authentication endpoints
//!
//! - POST /api/admin/login
//! - POST /api/admin/logout
//! - POST /api/admin/bootstrap
//! - GET  /api/admin/me

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::SuccessResponse;
use crate::api::middleware::{
    client_ip, extract_session_token, ApiError, ApiJson, AppState, AuthenticatedAdmin,
    SESSION_COOKIE,
};
use crate::config::AdminConfig;
use crate::models::{AdminRole, AdminUser};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub token: String,
}

/// Routes reachable without a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/bootstrap", post(bootstrap))
}

/// Routes behind `require_admin`
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

fn session_cookie(config: &AdminConfig, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, value, max_age
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` for the session token. An empty value with `max_age` 0 clears it.
fn session_cookie_headers(
    config: &AdminConfig,
    value: &str,
    max_age: i64,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&session_cookie(config, value, max_age))
            .map_err(ApiError::internal_error)?,
    );
    Ok(headers)
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers);
    let outcome = state
        .auth_service
        .login(body.email.as_deref(), body.password.as_deref(), ip.as_deref())
        .await?;

    let response_headers = session_cookie_headers(
        &state.admin_config,
        &outcome.session.id,
        state.admin_config.session_max_age(),
    )?;

    let admin = outcome.admin;
    Ok((
        response_headers,
        Json(LoginResponse {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            role: admin.role,
            token: outcome.session.id,
        }),
    ))
}

/// Always clears the cookie, even without a live session
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.auth_service.logout(&token).await?;
    }

    let response_headers = session_cookie_headers(&state.admin_config, "", 0)?;

    Ok((response_headers, Json(SuccessResponse::ok())))
}

async fn bootstrap(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<BootstrapRequest>,
) -> Result<(StatusCode, Json<AdminUser>), ApiError> {
    let admin = state
        .auth_service
        .bootstrap(body.name.as_deref(), body.email.as_deref(), body.password.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(admin)))
}

async fn me(Extension(AuthenticatedAdmin(admin)): Extension<AuthenticatedAdmin>) -> Json<AdminUser> {
    Json(admin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_secure_flag() {
        let mut config = AdminConfig::default();
        let cookie = session_cookie(&config, "abc", 60);
        assert_eq!(
            cookie,
            format!("{}=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60", SESSION_COOKIE)
        );

        config.cookie_secure = true;
        assert!(session_cookie(&config, "abc", 60).ends_with("; Secure"));

        let cleared = session_cookie(&config, "", 0);
        assert!(cleared.starts_with(&format!("{}=;", SESSION_COOKIE)));
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.ends_with("; Secure"));
    }
}
