//! Math Master · Arithmetic Quiz Backend
//!
//! - Axum HTTP + WebSocket API (one round session per socket)
//! - JSON-file player store and leaderboard
//! - Optional OpenAI-compatible coaching suggestions (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 8080)
//!   CONFIG_PATH      : path to TOML config (game rules, storage, prompts)
//!   DATA_DIR         : directory for players.json / leaderboard.json (default ./data)
//!   STATIC_DIR       : built frontend (default ./static)
//!   QUIZ_SEED        : u64, makes rounds reproducible
//!   OPENAI_API_KEY   : enables model suggestions if present
//!   OPENAI_BASE_URL  : default "https://api.openai.com/v1"
//!   OPENAI_MODEL     : default "gpt-4o-mini"
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use math_master::routes::build_router;
use math_master::state::AppState;
use math_master::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (store, rules, prompts, OpenAI client).
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  // Read port from env or default to 8080.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "math_master", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "math_master", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "math_master", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "math_master", "Shutdown signal received");
}
