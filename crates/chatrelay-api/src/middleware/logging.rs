use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

const CHAT_SOCKET_PREFIX: &str = "/ws/chat/";

/// Request logging middleware
///
/// Logs the matched route and latency of every request. Chat socket upgrades
/// also carry the `client_id`, and their duration covers the handshake only.
/// 4xx and 5xx responses are logged at `warn`.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned());
    let client_id = chat_client_id(&path).map(str::to_owned);
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    let route = route.as_deref().unwrap_or(path.as_str());

    if status.is_client_error() || status.is_server_error() {
        tracing::warn!(
            method = %method,
            route,
            path = %path,
            client_id = client_id.as_deref(),
            status = status.as_u16(),
            duration_ms,
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            route,
            client_id = client_id.as_deref(),
            status = status.as_u16(),
            duration_ms,
            "Request processed"
        );
    }

    response
}

/// Session id of a `/ws/chat/:client_id` request
fn chat_client_id(path: &str) -> Option<&str> {
    path.strip_prefix(CHAT_SOCKET_PREFIX)
        .filter(|id| !id.is_empty() && !id.contains('/'))
}
