use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chatrelay_relay::{Settings, SettingsUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    routes::StatusResponse,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettingsResponse {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub provider: String,
}

impl From<Settings> for SettingsResponse {
    fn from(settings: Settings) -> Self {
        Self {
            model: settings.model,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            provider: settings.provider.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    /// One of gpt-4o, gpt-4o-mini, gpt-4-turbo
    pub model: Option<String>,
    /// 1 to 4096
    pub max_tokens: Option<i64>,
    /// 0 to 2
    pub temperature: Option<f64>,
    /// Must match the active provider if given
    pub provider: Option<String>,
}

impl From<UpdateSettingsRequest> for SettingsUpdate {
    fn from(req: UpdateSettingsRequest) -> Self {
        Self {
            model: req.model,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            provider: req.provider,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Current settings", body = SettingsResponse)
    ),
    tag = "settings"
)]
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    Json(state.settings.snapshot().await.into())
}

/// Validate and apply a partial settings update; later turns use the new values
#[utoipa::path(
    post,
    path = "/api/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings applied", body = StatusResponse),
        (status = 400, description = "Invalid or malformed value; nothing applied")
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    req: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(req) = req.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    state.settings.apply(req.into()).await?;
    Ok(Json(StatusResponse::success()))
}
