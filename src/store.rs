//! Player and leaderboard persistence.
//!
//! Two flat JSON documents (`players.json`, `leaderboard.json`) under a data
//! directory. A document that fails to parse is logged, removed and treated
//! as empty; bad data on disk is never fatal.

use std::{
  fs,
  path::{Path, PathBuf},
  sync::Mutex,
};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{LeaderboardEntry, Player};

const PLAYERS_FILE: &str = "players.json";
const LEADERBOARD_FILE: &str = "leaderboard.json";

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("io error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Key-value persistence used by login and at round completion.
pub trait GameStore: Send + Sync {
  fn load_players(&self) -> Vec<Player>;
  fn save_player(&self, player: &Player) -> Result<(), StoreError>;
  /// Sorted by score, highest first.
  fn load_leaderboard(&self) -> Vec<LeaderboardEntry>;
  /// Insert, or raise the stored best if `score` beats it.
  fn record_score(&self, name: &str, score: u32) -> Result<(), StoreError>;

  fn get_player(&self, name: &str) -> Option<Player> {
    self.load_players().into_iter().find(|p| p.same_name(name))
  }
}

fn upsert_player(players: &mut Vec<Player>, player: &Player) {
  match players.iter_mut().find(|p| p.same_name(&player.name)) {
    Some(existing) => *existing = player.clone(),
    None => players.push(player.clone()),
  }
}

/// Returns true when the board changed.
fn upsert_score(board: &mut Vec<LeaderboardEntry>, name: &str, score: u32) -> bool {
  let lower = name.to_lowercase();
  match board.iter_mut().find(|e| e.name.to_lowercase() == lower) {
    Some(entry) if score > entry.score => {
      entry.score = score;
      true
    }
    Some(_) => false,
    None => {
      board.push(LeaderboardEntry { name: name.to_string(), score });
      true
    }
  }
}

fn sort_board(board: &mut [LeaderboardEntry]) {
  board.sort_by(|a, b| b.score.cmp(&a.score));
}

/// File-backed store. All access goes through one mutex so read-modify-write
/// cycles never interleave.
pub struct JsonFileStore {
  dir: PathBuf,
  lock: Mutex<()>,
}

impl JsonFileStore {
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let dir = dir.into();
    fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir.clone(), source })?;
    Ok(Self { dir, lock: Mutex::new(()) })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
    // The guard protects `()`, so poisoning carries no state.
    self.lock.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn read_or_empty<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
    let path = self.dir.join(file);
    let raw = match fs::read_to_string(&path) {
      Ok(s) => s,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
      Err(e) => {
        warn!(target: "math_master", path = %path.display(), error = %e, "Failed to read store file; treating as empty");
        return Vec::new();
      }
    };
    match serde_json::from_str::<Vec<T>>(&raw) {
      Ok(v) => v,
      Err(e) => {
        warn!(target: "math_master", path = %path.display(), error = %e, "Corrupted store file; discarding");
        if let Err(e) = fs::remove_file(&path) {
          warn!(target: "math_master", path = %path.display(), error = %e, "Failed to remove corrupted store file");
        }
        Vec::new()
      }
    }
  }

  /// Writes a sibling `.tmp` file and renames it over the document, so a
  /// reader sees either the old or the new contents.
  fn write<T: Serialize>(&self, file: &str, items: &[T]) -> Result<(), StoreError> {
    let path = self.dir.join(file);
    let tmp = self.dir.join(format!("{}.tmp", file));
    let json = serde_json::to_string_pretty(items)?;
    fs::write(&tmp, json).map_err(|source| StoreError::Io { path: tmp.clone(), source })?;
    fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path: path.clone(), source })?;
    debug!(target: "math_master", path = %path.display(), count = items.len(), "Store file written");
    Ok(())
  }
}

impl GameStore for JsonFileStore {
  fn load_players(&self) -> Vec<Player> {
    let _g = self.guard();
    self.read_or_empty(PLAYERS_FILE)
  }

  #[instrument(level = "debug", skip(self), fields(name = %player.name, level = player.level))]
  fn save_player(&self, player: &Player) -> Result<(), StoreError> {
    let _g = self.guard();
    let mut players: Vec<Player> = self.read_or_empty(PLAYERS_FILE);
    upsert_player(&mut players, player);
    self.write(PLAYERS_FILE, &players)
  }

  fn load_leaderboard(&self) -> Vec<LeaderboardEntry> {
    let _g = self.guard();
    let mut board: Vec<LeaderboardEntry> = self.read_or_empty(LEADERBOARD_FILE);
    sort_board(&mut board);
    board
  }

  #[instrument(level = "debug", skip(self))]
  fn record_score(&self, name: &str, score: u32) -> Result<(), StoreError> {
    let _g = self.guard();
    let mut board: Vec<LeaderboardEntry> = self.read_or_empty(LEADERBOARD_FILE);
    if upsert_score(&mut board, name, score) {
      sort_board(&mut board);
      self.write(LEADERBOARD_FILE, &board)?;
    }
    Ok(())
  }
}

/// In-process store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
  players: Mutex<Vec<Player>>,
  board: Mutex<Vec<LeaderboardEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl GameStore for MemoryStore {
  fn load_players(&self) -> Vec<Player> {
    self.players.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }

  fn save_player(&self, player: &Player) -> Result<(), StoreError> {
    let mut players = self.players.lock().unwrap_or_else(|e| e.into_inner());
    upsert_player(&mut players, player);
    Ok(())
  }

  fn load_leaderboard(&self) -> Vec<LeaderboardEntry> {
    let mut board = self.board.lock().unwrap_or_else(|e| e.into_inner()).clone();
    sort_board(&mut board);
    board
  }

  fn record_score(&self, name: &str, score: u32) -> Result<(), StoreError> {
    let mut board = self.board.lock().unwrap_or_else(|e| e.into_inner());
    upsert_score(&mut board, name, score);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_store_upserts_case_insensitively() {
    let store = MemoryStore::new();
    store.save_player(&Player::new("Ada", 1)).unwrap();
    store.save_player(&Player::new("ADA", 7)).unwrap();
    let players = store.load_players();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].level, 7);
    assert_eq!(store.get_player("ada").map(|p| p.level), Some(7));
  }

  #[test]
  fn record_score_keeps_best_only() {
    let store = MemoryStore::new();
    store.record_score("Ada", 50).unwrap();
    store.record_score("ada", 30).unwrap();
    store.record_score("Bo", 80).unwrap();
    let board = store.load_leaderboard();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0], LeaderboardEntry { name: "Bo".into(), score: 80 });
    assert_eq!(board[1].score, 50);

    store.record_score("ADA", 90).unwrap();
    let board = store.load_leaderboard();
    assert_eq!(board[0].name, "Ada");
    assert_eq!(board[0].score, 90);
  }
}
