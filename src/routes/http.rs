//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, http::StatusCode, Json, response::{IntoResponse, Response}};
use tracing::{info, instrument};

use crate::logic::{leaderboard, suggest};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// Plain-text liveness probe for container platforms.
pub async fn http_healthz() -> &'static str { "ok" }

#[instrument(level = "info", skip(state))]
pub async fn http_get_players(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let players = state.store.load_players();
  info!(target: "math_master", count = players.len(), "HTTP players listed");
  Json(players)
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name))]
pub async fn http_post_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> Response {
  match state.login(&body.name) {
    Ok((player, is_new)) => Json(LoginOut { player, is_new }).into_response(),
    Err(e) => (StatusCode::BAD_REQUEST, Json(ErrorOut { error: e.to_string() })).into_response(),
  }
}

#[instrument(level = "info", skip(state), fields(limit = ?q.limit))]
pub async fn http_get_leaderboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LeaderboardQuery>,
) -> impl IntoResponse {
  Json(leaderboard(&state, q.limit))
}

#[instrument(level = "info", skip(state, body), fields(mistakes = body.mistakes.len(), player_level = body.player_level))]
pub async fn http_post_suggestions(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SuggestionsIn>,
) -> impl IntoResponse {
  let suggestions = suggest(&state, &body.mistakes, body.player_level).await;
  info!(target: "math_master", len = suggestions.len(), "HTTP suggestions served");
  Json(SuggestionsOut { suggestions })
}
