//! Application state: persistence, game rules, prompts and the optional model client.
//!
//! This module owns:
//!   - the player/leaderboard store (JSON files, or in-memory as a fallback)
//!   - the game rules (from TOML or defaults)
//!   - the prompts struct (from TOML or defaults)
//!   - optional OpenAI client
//!   - the random-seed policy for new sessions

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::config::{load_config_from_env, AppConfig, GameRules, Prompts};
use crate::domain::{Operation, Player};
use crate::openai::OpenAI;
use crate::rng::{game_rng, seed_from_env, GameRng};
use crate::session::{RoundSession, RoundSummary};
use crate::store::{GameStore, JsonFileStore, MemoryStore};
use crate::util::clean_name;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("player name must not be empty")]
    EmptyName,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
    pub rules: GameRules,
    base_seed: Option<u64>,
    sessions_started: Arc<AtomicU64>,
}

impl AppState {
    /// Build state from env: load config, open the store, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env().unwrap_or_default();
        let AppConfig { game, storage, prompts } = cfg;

        let data_dir = storage.resolve_data_dir();
        let store: Arc<dyn GameStore> = match JsonFileStore::open(&data_dir) {
            Ok(s) => {
                info!(target: "math_master", dir = %data_dir.display(), players = s.load_players().len(), "Player store ready");
                Arc::new(s)
            }
            Err(e) => {
                error!(target: "math_master", dir = %data_dir.display(), error = %e, "Cannot open data dir; players will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        // Build optional OpenAI client (if API key present).
        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "math_master", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
        } else {
            info!(target: "math_master", "OpenAI disabled (no OPENAI_API_KEY). Using local coaching tips.");
        }

        let base_seed = seed_from_env();
        if let Some(seed) = base_seed {
            warn!(target: "math_master", seed, "QUIZ_SEED set; rounds are reproducible");
        }

        Self::with_parts(store, openai, prompts, game, base_seed)
    }

    /// Assemble state from explicit parts (used by tests and embedders).
    pub fn with_parts(
        store: Arc<dyn GameStore>,
        openai: Option<OpenAI>,
        prompts: Prompts,
        rules: GameRules,
        base_seed: Option<u64>,
    ) -> Self {
        Self {
            store,
            openai,
            prompts,
            rules: rules.normalized(),
            base_seed,
            sessions_started: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Generator for a new session. With a base seed, the n-th session gets
    /// `base + n`, so a restart replays the same sequence of rounds.
    pub fn session_rng(&self) -> GameRng {
        let n = self.sessions_started.fetch_add(1, Ordering::Relaxed);
        game_rng(self.base_seed.map(|s| s.wrapping_add(n)))
    }

    /// Find a player by name or create one at the starting level.
    /// Returns the player and whether it was just created.
    #[instrument(level = "info", skip(self))]
    pub fn login(&self, name: &str) -> Result<(Player, bool), LoginError> {
        let name = clean_name(name);
        if name.is_empty() {
            return Err(LoginError::EmptyName);
        }
        if let Some(existing) = self.store.get_player(&name) {
            info!(target: "math_master", name = %existing.name, level = existing.level, "Returning player");
            return Ok((existing, false));
        }
        let player = Player::new(name, self.rules.starting_level);
        if let Err(e) = self.store.save_player(&player) {
            error!(target: "math_master", name = %player.name, error = %e, "Failed to save new player");
        }
        info!(target: "math_master", name = %player.name, level = player.level, "New player created");
        Ok((player, true))
    }

    pub fn start_quiz(&self, player: Player) -> RoundSession {
        RoundSession::quiz(player, self.rules.clone(), self.session_rng())
    }

    pub fn start_practice(&self, player: Player, operation: Operation) -> RoundSession {
        RoundSession::practice(player, operation, self.rules.clone(), self.session_rng())
    }

    /// Persist the outcome of a completed round. Failures are logged only.
    #[instrument(level = "info", skip(self, summary), fields(name = %summary.player.name, score = summary.score, level = summary.player.level))]
    pub fn finish_round(&self, summary: &RoundSummary) {
        if let Err(e) = self.store.save_player(&summary.player) {
            error!(target: "math_master", error = %e, "Failed to save player level");
        }
        if let Err(e) = self.store.record_score(&summary.player.name, summary.score) {
            error!(target: "math_master", error = %e, "Failed to update leaderboard");
        }
        info!(target: "quiz", mistakes = summary.mistakes.len(), total = summary.total_questions, "Round persisted");
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_parts(Arc::new(MemoryStore::new()), None, Prompts::default(), GameRules::default(), None)
    }
}
