//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Coaching suggestions for a round's mistakes (model or local fallback)
//!   - Leaderboard slicing

use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

use crate::domain::{LeaderboardEntry, Mistake, Operation};
use crate::state::AppState;
use crate::util::trunc_for_log;

pub const NO_MISTAKES_MESSAGE: &str = "You didn't make any mistakes! Amazing job!";
pub const SUGGESTION_FALLBACK: &str =
  "Sorry, I couldn't generate suggestions at this time. Keep practicing, you're doing great!";

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Coaching tips for a finished round. Never fails: an empty mistake list
/// short-circuits, and any model failure degrades to a canned message.
#[instrument(level = "info", skip(state, mistakes), fields(mistake_count = mistakes.len()))]
pub async fn suggest(state: &AppState, mistakes: &[Mistake], player_level: u32) -> String {
  if mistakes.is_empty() {
    return NO_MISTAKES_MESSAGE.to_string();
  }

  match &state.openai {
    Some(oa) => match oa.suggest_improvements(&state.prompts, mistakes, player_level).await {
      Ok(text) => {
        debug!(target: "math_master", preview = %trunc_for_log(&text, 80), "Suggestions via OpenAI.");
        text
      }
      Err(e) => {
        warn!(target: "math_master", error = %e, "Suggestion call failed; using fallback message.");
        SUGGESTION_FALLBACK.to_string()
      }
    },
    None => {
      debug!(target: "math_master", "Suggestions via local tips.");
      local_suggestions(mistakes)
    }
  }
}

pub fn leaderboard(state: &AppState, limit: Option<usize>) -> Vec<LeaderboardEntry> {
  let mut board = state.store.load_leaderboard();
  board.truncate(limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT));
  board
}

// -------- Local fallbacks --------

/// Bullet list built from per-operation mistake counts, worst operation first.
pub fn local_suggestions(mistakes: &[Mistake]) -> String {
  let mut by_op: BTreeMap<Operation, (usize, usize)> = BTreeMap::new();
  for m in mistakes {
    let entry = by_op.entry(m.operation).or_default();
    entry.0 += 1;
    if m.not_attempted() {
      entry.1 += 1;
    }
  }

  let mut ranked: Vec<(Operation, usize, usize)> = by_op.into_iter().map(|(op, (n, t))| (op, n, t)).collect();
  ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

  let mut tips: Vec<String> = ranked.iter().take(2).map(|(op, n, _)| tip_for(*op, *n)).collect();

  let timed_out: usize = ranked.iter().map(|(_, _, t)| t).sum();
  if timed_out > 0 {
    tips.push(format!(
      "You ran out of time on {} question{}. Enter your best estimate early, then refine it if the clock allows.",
      timed_out,
      if timed_out == 1 { "" } else { "s" }
    ));
  } else {
    tips.push("Keep going! Every round at your level makes the next one easier.".into());
  }

  tips.iter().map(|t| format!("• {}", t)).collect::<Vec<_>>().join("\n")
}

fn tip_for(op: Operation, count: usize) -> String {
  let times = if count == 1 { "once".to_string() } else { format!("{} times", count) };
  match op {
    Operation::Addition => format!(
      "Addition tripped you up {}. Add the tens first, then the ones, and watch the carry.",
      times
    ),
    Operation::Subtraction => format!(
      "Subtraction tripped you up {}. Count up from the smaller number to check your borrowing.",
      times
    ),
    Operation::Multiplication => format!(
      "Multiplication tripped you up {}. Split the bigger number into tens and ones and multiply each part.",
      times
    ),
    Operation::Division => format!(
      "Division tripped you up {}. Ask which times-table fact gives the dividend, then check by multiplying back.",
      times
    ),
  }
}
