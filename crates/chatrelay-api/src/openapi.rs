use axum::Json;
use utoipa::OpenApi;

use crate::routes::{health, history, settings};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        history::get_history,
        history::clear_history,
        settings::get_settings,
        settings::update_settings,
    ),
    components(schemas(
        health::HealthResponse,
        history::HistoryResponse,
        history::MessageResponse,
        settings::SettingsResponse,
        settings::UpdateSettingsRequest,
        crate::routes::StatusResponse,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "history", description = "Stored chat transcript"),
        (name = "settings", description = "Runtime generation settings"),
    )
)]
pub struct ApiDoc;

/// OpenAPI document for the REST surface
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
