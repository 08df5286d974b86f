//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Directory holding the built frontend (`STATIC_DIR`, default `./static`).
pub fn static_dir() -> String {
    std::env::var("STATIC_DIR").unwrap_or_else(|_| "./static".into())
}

/// Build the application router with:
/// - WebSocket at `/ws` (one round session per connection)
/// - REST-ish API under `/api/v1/...`, plus `/api/suggestions` for older clients
/// - Static SPA from the static dir with index fallback
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let dir = static_dir();
    let static_service = ServeDir::new(&dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{}/index.html", dir)));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Probes
        .route("/healthz", get(http::http_healthz))
        .route("/api/v1/health", get(http::http_health))
        // HTTP API
        .route("/api/v1/players", get(http::http_get_players))
        .route("/api/v1/login", post(http::http_post_login))
        .route("/api/v1/leaderboard", get(http::http_get_leaderboard))
        .route("/api/v1/suggestions", post(http::http_post_suggestions))
        .route("/api/suggestions", post(http::http_post_suggestions))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
