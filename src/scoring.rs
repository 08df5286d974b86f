//! Score and level adjustments applied after each answer.

use crate::config::GameRules;
use crate::domain::Mode;

/// Signed change produced by one answer. The caller applies it with clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ScoreChange {
  pub score_delta: i64,
  pub level_delta: i64,
}

impl ScoreChange {
  /// Apply to a running score/level. Score floors at 0, level at 1.
  pub fn apply(self, score: u32, level: u32) -> (u32, u32) {
    let score = (i64::from(score) + self.score_delta).clamp(0, i64::from(u32::MAX)) as u32;
    let level = (i64::from(level) + self.level_delta).clamp(1, i64::from(u32::MAX)) as u32;
    (score, level)
  }
}

/// Seconds allowed for a question at `level`.
pub fn time_budget(rules: &GameRules, level: u32) -> u32 {
  rules.base_time_secs.saturating_add(level / 4)
}

/// Points deducted for a wrong answer or timeout: `floor(base/2 + level/2)`.
pub fn penalty(rules: &GameRules, level: u32) -> u32 {
  ((u64::from(rules.base_score) + u64::from(level)) / 2) as u32
}

/// Points for a correct answer: `base + 2*level + floor(1.5 * remaining)`.
/// Saturates at `u32::MAX`.
pub fn reward(rules: &GameRules, level: u32, time_remaining: u32) -> u32 {
  let points = u64::from(rules.base_score) + 2 * u64::from(level) + (3 * u64::from(time_remaining)) / 2;
  u32::try_from(points).unwrap_or(u32::MAX)
}

/// Strictly more than three quarters of the budget left.
pub fn is_fast(time_remaining: u32, time_budget: u32) -> bool {
  u64::from(time_remaining) * 4 > u64::from(time_budget) * 3
}

/// Score/level change for one answer. Practice never moves either.
pub fn on_answer(
  rules: &GameRules,
  mode: Mode,
  correct: bool,
  time_remaining: u32,
  time_budget: u32,
  level: u32,
) -> ScoreChange {
  if mode.is_practice() {
    return ScoreChange::default();
  }
  if correct {
    ScoreChange {
      score_delta: i64::from(reward(rules, level, time_remaining)),
      level_delta: if is_fast(time_remaining, time_budget) { 2 } else { 1 },
    }
  } else {
    ScoreChange {
      score_delta: -i64::from(penalty(rules, level)),
      level_delta: -1,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Operation;

  fn rules() -> GameRules {
    GameRules::default()
  }

  #[test]
  fn fast_answer_earns_two_levels() {
    let c = on_answer(&rules(), Mode::Quiz, true, 8, 10, 5);
    assert_eq!(c.level_delta, 2);
    assert_eq!(c.score_delta, 10 + 10 + 12);
  }

  #[test]
  fn slower_answer_earns_one_level() {
    let c = on_answer(&rules(), Mode::Quiz, true, 5, 10, 5);
    assert_eq!(c.level_delta, 1);
    assert_eq!(c.score_delta, 10 + 10 + 7);
  }

  #[test]
  fn exactly_three_quarters_is_not_fast() {
    assert!(!is_fast(3, 4));
    assert!(is_fast(4, 4));
    assert!(!is_fast(0, 0));
  }

  #[test]
  fn wrong_answer_penalty() {
    let r = rules();
    // floor(10/2 + 5/2) = floor(7.5) = 7
    assert_eq!(penalty(&r, 5), 7);
    let c = on_answer(&r, Mode::Quiz, false, 6, 10, 5);
    assert_eq!(c, ScoreChange { score_delta: -7, level_delta: -1 });
  }

  #[test]
  fn score_and_level_clamp() {
    let c = on_answer(&rules(), Mode::Quiz, false, 0, 10, 5);
    assert_eq!(c.apply(3, 1), (0, 1));
    assert_eq!(c.apply(20, 4), (13, 3));
  }

  #[test]
  fn practice_is_neutral() {
    let mode = Mode::Practice(Operation::Division);
    assert_eq!(on_answer(&rules(), mode, true, 10, 10, 9), ScoreChange::default());
    assert_eq!(on_answer(&rules(), mode, false, 0, 10, 9), ScoreChange::default());
  }

  #[test]
  fn time_budget_grows_every_four_levels() {
    let r = rules();
    assert_eq!(time_budget(&r, 1), 10);
    assert_eq!(time_budget(&r, 3), 10);
    assert_eq!(time_budget(&r, 4), 11);
    assert_eq!(time_budget(&r, 21), 15);
  }

  #[test]
  fn huge_configured_constants_saturate() {
    let r = GameRules { base_score: u32::MAX, base_time_secs: u32::MAX, ..GameRules::default() };
    assert_eq!(time_budget(&r, 40), u32::MAX);
    assert_eq!(reward(&r, 40, 10), u32::MAX);
    assert_eq!(penalty(&r, u32::MAX), u32::MAX);
    let c = on_answer(&r, Mode::Quiz, true, u32::MAX, u32::MAX, u32::MAX);
    assert_eq!(c.apply(u32::MAX, u32::MAX), (u32::MAX, u32::MAX));
  }
}
