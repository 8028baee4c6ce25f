use axum::{
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::ws,
    middleware::logging,
    openapi,
    routes::{health, history, settings},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    // REST routes; the socket route stays outside compression and timeout
    let api_routes = Router::new()
        .route(
            "/chat/history",
            get(history::get_history).delete(history::clear_history),
        )
        .route(
            "/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .route("/openapi.json", get(openapi::openapi_json))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CompressionLayer::new());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ws/chat/:client_id", get(ws::ws_handler))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            let origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            cors = cors.allow_origin(origins);
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}
