//! WebSocket upgrade + message loop. Each connection owns at most one round
//! session; client messages are parsed as JSON and forwarded to the session
//! or core logic. A one-second ticker drives the countdown while a quiz
//! question is waiting for an answer.

use std::{sync::Arc, time::Duration};
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing::{debug, error, info, instrument, Instrument};
use uuid::Uuid;

use crate::domain::Player;
use crate::logic::{leaderboard, suggest};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::{Advance, RoundSession, RoundSummary};
use crate::state::AppState;
use crate::util::split_suggestions;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "math_master", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| {
    let conn_id = Uuid::new_v4();
    handle_ws(socket, state).instrument(tracing::info_span!("ws", %conn_id))
  })
}

/// Per-connection state. Replacing `session` discards the running round.
pub(crate) struct Connection {
  player: Option<Player>,
  session: Option<RoundSession>,
  last_round: Option<RoundSummary>,
  /// Replies produced by background tasks; drained by the socket loop.
  outbox: mpsc::UnboundedSender<ServerWsMessage>,
}

impl Connection {
  fn new() -> (Self, mpsc::UnboundedReceiver<ServerWsMessage>) {
    let (outbox, deferred) = mpsc::unbounded_channel();
    (Self { player: None, session: None, last_round: None, outbox }, deferred)
  }

  fn timer_running(&self) -> bool {
    self.session.as_ref().is_some_and(|s| s.timer_running())
  }
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "math_master", "WebSocket connected");
  let (mut conn, mut deferred) = Connection::new();
  let mut ticker = tokio::time::interval(Duration::from_secs(1));
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  loop {
    let replies = tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => match serde_json::from_str::<ClientWsMessage>(&txt) {
            Ok(m) => {
              debug!(target: "math_master", "WS received: {:?}", &m);
              handle_client_ws(m, &state, &mut conn)
            }
            Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
          },
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; continue; }
          Message::Close(_) => break,
          _ => continue,
        }
      }
      _ = ticker.tick(), if conn.timer_running() => on_tick(&mut conn),
      Some(reply) = deferred.recv() => vec![reply],
    };

    // A fresh question restarts the countdown from a full second.
    if replies.iter().any(|r| matches!(r, ServerWsMessage::Question { .. })) {
      ticker.reset();
    }

    if let Err(e) = send_all(&mut socket, replies).await {
      error!(target: "math_master", error = %e, "WS send error");
      break;
    }
  }
  info!(target: "math_master", "WebSocket disconnected");
}

async fn send_all(socket: &mut WebSocket, replies: Vec<ServerWsMessage>) -> Result<(), axum::Error> {
  for reply in replies {
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    socket.send(Message::Text(out)).await?;
  }
  Ok(())
}

fn on_tick(conn: &mut Connection) -> Vec<ServerWsMessage> {
  let Some(session) = conn.session.as_mut() else { return Vec::new() };
  match session.tick() {
    Some(feedback) => {
      info!(target: "quiz", index = session.question_index(), "Question timed out");
      vec![ServerWsMessage::Tick { time_left: 0 }, ServerWsMessage::Feedback { feedback }]
    }
    None => vec![ServerWsMessage::Tick { time_left: session.time_left() }],
  }
}

fn error_msg(message: impl ToString) -> Vec<ServerWsMessage> {
  vec![ServerWsMessage::Error { message: message.to_string() }]
}

#[instrument(level = "info", skip(state, conn))]
pub(crate) fn handle_client_ws(msg: ClientWsMessage, state: &AppState, conn: &mut Connection) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::Login { name } => match state.login(&name) {
      Ok((player, is_new)) => {
        conn.session = None;
        conn.last_round = None;
        conn.player = Some(player.clone());
        vec![ServerWsMessage::Player { player, is_new }]
      }
      Err(e) => error_msg(e),
    },

    ClientWsMessage::StartRound => {
      let Some(player) = conn.player.clone() else { return error_msg("Log in before starting a round.") };
      let session = state.start_quiz(player);
      info!(target: "quiz", player = %session.player().name, level = session.level(), "WS round started");
      let question = session.question_view();
      conn.session = Some(session);
      vec![ServerWsMessage::Question { question }]
    }

    ClientWsMessage::StartPractice { operation } => {
      let player = conn.player.get_or_insert_with(Player::guest).clone();
      let session = state.start_practice(player, operation);
      info!(target: "quiz", player = %session.player().name, ?operation, "WS practice started");
      let question = session.question_view();
      conn.session = Some(session);
      vec![ServerWsMessage::Question { question }]
    }

    ClientWsMessage::SubmitAnswer { answer } => {
      let Some(session) = conn.session.as_mut() else { return error_msg("No active round.") };
      match session.submit(&answer) {
        Ok(feedback) => vec![ServerWsMessage::Feedback { feedback }],
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::Proceed => {
      let Some(session) = conn.session.as_mut() else { return error_msg("No active round.") };
      match session.proceed() {
        Ok(Advance::Next(question)) => vec![ServerWsMessage::Question { question }],
        Ok(Advance::Complete(summary)) => {
          state.finish_round(&summary);
          conn.session = None;
          conn.player = Some(summary.player.clone());
          conn.last_round = Some(summary.clone());
          vec![ServerWsMessage::RoundComplete { summary }]
        }
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::EndPractice => {
      let Some(session) = conn.session.as_ref() else { return error_msg("No active practice.") };
      match session.practice_report() {
        Ok(report) => {
          conn.session = None;
          vec![ServerWsMessage::PracticeEnded { report }]
        }
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::Suggestions => {
      let Some(last) = conn.last_round.as_ref() else { return error_msg("No completed round yet.") };
      // Answered off the loop; the reply arrives through the outbox.
      let state = state.clone();
      let mistakes = last.mistakes.clone();
      let level = last.player.level;
      let outbox = conn.outbox.clone();
      tokio::spawn(
        async move {
          let suggestions = suggest(&state, &mistakes, level).await;
          let tips = split_suggestions(&suggestions);
          if outbox.send(ServerWsMessage::Suggestions { suggestions, tips }).is_err() {
            debug!(target: "math_master", "Connection closed before suggestions arrived");
          }
        }
        .in_current_span(),
      );
      Vec::new()
    }

    ClientWsMessage::Leaderboard { limit } => {
      vec![ServerWsMessage::Leaderboard { entries: leaderboard(state, limit) }]
    }
  }
}
