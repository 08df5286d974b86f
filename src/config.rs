//! Loading app configuration (game rules, storage, coaching prompts) from TOML.
//!
//! Every table and field is optional; missing values fall back to `Default`.
//!
//! ```toml
//! [game]
//! questions_per_round = 12
//! base_time_secs = 8
//!
//! [storage]
//! data_dir = "/var/lib/math-master"
//!
//! [prompts]
//! suggestion_system = "..."
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::round::MIN_ROUND_SIZE;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub game: GameRules,
  #[serde(default)]
  pub storage: StorageCfg,
  #[serde(default)]
  pub prompts: Prompts,
}

/// Tunable constants of the quiz engine.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameRules {
  pub questions_per_round: usize,
  pub base_time_secs: u32,
  pub base_score: u32,
  pub starting_level: u32,
}

impl Default for GameRules {
  fn default() -> Self {
    Self {
      questions_per_round: 10,
      base_time_secs: 10,
      base_score: 10,
      starting_level: 1,
    }
  }
}

impl GameRules {
  /// Raise values that would break engine invariants.
  pub fn normalized(mut self) -> Self {
    if self.questions_per_round < MIN_ROUND_SIZE {
      warn!(target: "math_master", configured = self.questions_per_round, min = MIN_ROUND_SIZE, "questions_per_round too small; raising to minimum");
      self.questions_per_round = MIN_ROUND_SIZE;
    }
    if self.base_time_secs == 0 {
      warn!(target: "math_master", "base_time_secs must be positive; using 1");
      self.base_time_secs = 1;
    }
    self.starting_level = self.starting_level.max(1);
    self
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct StorageCfg {
  #[serde(default)]
  pub data_dir: Option<PathBuf>,
}

impl StorageCfg {
  /// `DATA_DIR` env wins over the TOML value; `./data` otherwise.
  pub fn resolve_data_dir(&self) -> PathBuf {
    std::env::var("DATA_DIR")
      .ok()
      .filter(|s| !s.trim().is_empty())
      .map(PathBuf::from)
      .or_else(|| self.data_dir.clone())
      .unwrap_or_else(|| PathBuf::from("./data"))
  }
}

/// Prompts used when asking the model for coaching tips.
/// Placeholders: `{player_level}`, `{mistake_summary}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub suggestion_system: String,
  pub suggestion_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      suggestion_system: "You are a friendly math coach for a mental-arithmetic game called \"Math Master\". Be brief, encouraging and concrete.".into(),
      suggestion_user_template: "A player just finished a round. Their current skill level is {player_level}.\nThey made the following mistakes:\n{mistake_summary}\n\nBased on these mistakes, analyze any patterns (e.g., trouble with a specific operation, carrying/borrowing, certain numbers) and provide 2-3 short, encouraging, and actionable suggestions for improvement. Address the player directly.\nFormat the response as a single string, with each suggestion starting with a bullet point (•).".into(),
    }
  }
}

/// Parse a TOML document into `AppConfig`.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "math_master", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "math_master", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "math_master", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
