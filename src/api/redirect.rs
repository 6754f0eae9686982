//! Outbound redirect routes
//!
//! - GET /go/{slug}
//! - GET /redirect/{slug}
//! - GET /redirect/{slug}/{linkId}

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};

use crate::api::middleware::{client_ip, ApiError, ApiPath, AppState};
use crate::models::NewLinkClick;
use crate::services::RedirectOutcome;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/go/{slug}", get(go))
        .route("/redirect/{slug}", get(redirect_top))
        .route("/redirect/{slug}/{link_id}", get(redirect_link))
}

async fn go(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Redirect, ApiError> {
    let location = state.redirect_service.go(&slug).await?;
    Ok(Redirect::temporary(&location))
}

async fn redirect_top(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Response, ApiError> {
    let outcome = state
        .redirect_service
        .redirect(&slug, None, NewLinkClick::default())
        .await?;
    Ok(respond(outcome))
}

async fn redirect_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath((slug, link_id)): ApiPath<(String, i64)>,
) -> Result<Response, ApiError> {
    let click = NewLinkClick {
        user_agent: header_text(&headers, header::USER_AGENT),
        ip_address: client_ip(&headers),
        referrer: header_text(&headers, header::REFERER),
    };
    let outcome = state
        .redirect_service
        .redirect(&slug, Some(link_id), click)
        .await?;
    Ok(respond(outcome))
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn respond(outcome: RedirectOutcome) -> Response {
    match outcome {
        RedirectOutcome::Redirect(location) => Redirect::temporary(&location).into_response(),
        RedirectOutcome::Interstitial(html) => Html(html).into_response(),
    }
}
