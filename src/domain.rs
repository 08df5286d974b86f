//! Domain models: players, leaderboard entries, operations, questions and mistakes.

use serde::{Deserialize, Serialize};

/// A registered player. `name` is the unique key (compared case-insensitively).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
  pub name: String,
  pub level: u32,
}

impl Player {
  pub fn new(name: impl Into<String>, level: u32) -> Self {
    Self { name: name.into(), level: level.max(1) }
  }

  /// Profile used for practice when nobody has logged in.
  pub fn guest() -> Self {
    Self::new("Guest", 1)
  }

  pub fn same_name(&self, other: &str) -> bool {
    self.name.to_lowercase() == other.to_lowercase()
  }
}

/// Best score recorded for a player.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
  pub name: String,
  pub score: u32,
}

/// The four arithmetic operations a question can use.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Addition,
  Subtraction,
  Multiplication,
  Division,
}

impl Operation {
  pub const ALL: [Operation; 4] = [
    Operation::Addition,
    Operation::Subtraction,
    Operation::Multiplication,
    Operation::Division,
  ];

  /// Symbol used when rendering the expression.
  pub fn symbol(self) -> &'static str {
    match self {
      Operation::Addition => "+",
      Operation::Subtraction => "-",
      Operation::Multiplication => "×",
      Operation::Division => "÷",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Operation::Addition => "addition",
      Operation::Subtraction => "subtraction",
      Operation::Multiplication => "multiplication",
      Operation::Division => "division",
    }
  }
}

/// A generated problem. Lives only for the current question.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
  pub text: String,
  pub answer: i64,
}

/// A wrong (or timed-out) answer. `user_answer` is empty when nothing was submitted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Mistake {
  pub question_text: String,
  pub user_answer: String,
  pub correct_answer: i64,
  pub operation: Operation,
}

impl Mistake {
  pub fn not_attempted(&self) -> bool {
    self.user_answer.is_empty()
  }
}

/// Quiz rounds have a fixed length, a timer and score/level progression.
/// Practice drills a single operation with neither.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "operation", rename_all = "snake_case")]
pub enum Mode {
  Quiz,
  Practice(Operation),
}

impl Mode {
  pub fn is_practice(&self) -> bool {
    matches!(self, Mode::Practice(_))
  }
}
