use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chatrelay_persist::{ChatMessage, HistoryQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ApiError, ApiResult},
    routes::StatusResponse,
    state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// Page size, capped at 100 (default: 50)
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    /// Substring filter on message content
    pub search: Option<String>,
}

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: i64,
    pub role: String,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub model: Option<String>,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            role: message.role.to_string(),
            content: message.content,
            timestamp: message.timestamp,
            model: message.model,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub messages: Vec<MessageResponse>,
    pub total: u64,
}

/// List stored messages, newest page first, each page in chronological order
#[utoipa::path(
    get,
    path = "/api/chat/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "A page of history", body = HistoryResponse),
        (status = 400, description = "Malformed query string")
    ),
    tag = "history"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<Json<HistoryResponse>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = state
        .store
        .list(HistoryQuery {
            limit: params.limit,
            offset: params.offset,
            search: params.search,
        })
        .await?;

    Ok(Json(HistoryResponse {
        messages: page.messages.into_iter().map(MessageResponse::from).collect(),
        total: page.total,
    }))
}

/// Delete the entire transcript
#[utoipa::path(
    delete,
    path = "/api/chat/history",
    responses(
        (status = 200, description = "History cleared", body = StatusResponse)
    ),
    tag = "history"
)]
pub async fn clear_history(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatusResponse>> {
    state.store.clear().await?;
    Ok(Json(StatusResponse::success()))
}
