//! Site settings endpoints

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{SiteSettings, UpdateSettingsInput};

/// GET and PUT /api/admin/settings
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

/// GET /api/public/settings
pub fn public_router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<SiteSettings>, ApiError> {
    Ok(Json(state.settings_service.get_or_create().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UpdateSettingsInput>,
) -> Result<Json<SiteSettings>, ApiError> {
    Ok(Json(state.settings_service.update(input).await?))
}
