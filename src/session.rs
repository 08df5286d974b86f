//! Round session state machine.
//!
//! A session owns the running level, score, streak, mistakes and the current
//! question, and moves through
//! `AwaitingAnswer -> Feedback -> AwaitingAnswer -> ... -> Complete`
//! in response to discrete events: `submit`, `tick`/`time_out` and `proceed`.
//! Practice sessions never complete and have no timer; they are simply dropped.
//!
//! The session does not touch storage. On completion it hands back a
//! [`RoundSummary`] and the caller persists it.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::GameRules;
use crate::domain::{Mistake, Mode, Operation, Player, Question};
use crate::question;
use crate::rng::GameRng;
use crate::round;
use crate::scoring::{self, ScoreChange};

/// Events rejected at the input boundary. None of these change the session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("answer is empty")]
  EmptyAnswer,
  #[error("answer is not a whole number: {0:?}")]
  NotANumber(String),
  #[error("no question is waiting for an answer")]
  NotAwaitingAnswer,
  #[error("nothing to proceed from; answer the current question first")]
  NotInFeedback,
  #[error("practice sessions have no timer")]
  NoTimer,
  #[error("not a practice session")]
  NotPractice,
}

/// Result of judging one answer.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
  pub correct: bool,
  pub timed_out: bool,
  pub question_text: String,
  pub correct_answer: i64,
  pub user_answer: String,
  pub score_delta: i64,
  pub level_delta: i64,
  pub score: u32,
  pub level: u32,
  pub streak: u32,
}

/// Emitted once when a quiz round finishes.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
  pub score: u32,
  pub player: Player,
  pub mistakes: Vec<Mistake>,
  pub total_questions: usize,
  /// Operations the player got wrong, for follow-up practice.
  pub practice_topics: Vec<Operation>,
}

impl RoundSummary {
  pub fn correct_answers(&self) -> usize {
    self.total_questions.saturating_sub(self.mistakes.len())
  }
}

/// Snapshot of the question currently shown to the player.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
  pub index: usize,
  /// `None` in practice mode (unbounded).
  pub total: Option<usize>,
  pub text: String,
  pub operation: Operation,
  /// `None` in practice mode (no timer).
  pub time_budget: Option<u32>,
  pub level: u32,
  pub score: u32,
  pub streak: u32,
  pub mode: Mode,
}

/// Totals reported when a practice session is ended.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PracticeReport {
  pub operation: Operation,
  pub answered: usize,
  pub correct: usize,
  pub streak: u32,
  pub best_streak: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
  AwaitingAnswer,
  Feedback(AnswerFeedback),
  Complete(RoundSummary),
}

/// What `proceed` moved the session to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
  Next(QuestionView),
  Complete(RoundSummary),
}

pub struct RoundSession {
  rules: GameRules,
  player: Player,
  mode: Mode,
  level: u32,
  score: u32,
  question_index: usize,
  operation_queue: Vec<Operation>,
  mistakes: Vec<Mistake>,
  correct_streak: u32,
  best_streak: u32,
  answered: usize,
  question: Question,
  operation: Operation,
  time_budget: u32,
  time_left: u32,
  phase: Phase,
  rng: GameRng,
}

impl RoundSession {
  /// Start a timed quiz round at the player's stored level.
  pub fn quiz(player: Player, rules: GameRules, mut rng: GameRng) -> Self {
    let level = player.level.max(1);
    let queue = round::compose_round(level, rules.questions_per_round, &mut rng);
    debug!(target: "quiz", player = %player.name, level, ops = ?queue, "Round composed");
    Self::start(player, rules, Mode::Quiz, queue, rng)
  }

  /// Start an untimed practice session on one operation. The player's level
  /// only scales difficulty and is never changed.
  pub fn practice(player: Player, operation: Operation, rules: GameRules, rng: GameRng) -> Self {
    debug!(target: "quiz", player = %player.name, ?operation, "Practice started");
    Self::start(player, rules, Mode::Practice(operation), Vec::new(), rng)
  }

  fn start(player: Player, rules: GameRules, mode: Mode, queue: Vec<Operation>, rng: GameRng) -> Self {
    let level = player.level.max(1);
    let mut s = Self {
      rules,
      player,
      mode,
      level,
      score: 0,
      question_index: 1,
      operation_queue: queue,
      mistakes: Vec::new(),
      correct_streak: 0,
      best_streak: 0,
      answered: 0,
      question: Question { text: String::new(), answer: 0 },
      operation: Operation::Addition,
      time_budget: 0,
      time_left: 0,
      phase: Phase::AwaitingAnswer,
      rng,
    };
    s.load_question();
    s
  }

  fn next_operation(&self) -> Operation {
    match self.mode {
      Mode::Practice(op) => op,
      // `proceed` completes the round before the index passes the queue.
      Mode::Quiz => self
        .operation_queue
        .get(self.question_index - 1)
        .copied()
        .unwrap_or(Operation::Addition),
    }
  }

  fn load_question(&mut self) {
    let op = self.next_operation();
    let (q, used) = question::generate(self.level, Some(op), &mut self.rng);
    self.question = q;
    self.operation = used;
    self.time_budget = scoring::time_budget(&self.rules, self.level);
    self.time_left = self.time_budget;
    self.phase = Phase::AwaitingAnswer;
    debug!(target: "quiz", index = self.question_index, text = %self.question.text, budget = self.time_budget, "Question ready");
  }

  /// Submit a typed answer. Empty or non-integer input is rejected and
  /// nothing is recorded.
  pub fn submit(&mut self, raw: &str) -> Result<AnswerFeedback, SessionError> {
    if self.phase != Phase::AwaitingAnswer {
      return Err(SessionError::NotAwaitingAnswer);
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(SessionError::EmptyAnswer);
    }
    let value: i64 = trimmed
      .parse()
      .map_err(|_| SessionError::NotANumber(trimmed.to_string()))?;

    let remaining = if self.mode.is_practice() { 0 } else { self.time_left };
    Ok(self.judge(value == self.question.answer, remaining, trimmed.to_string(), false))
  }

  /// One second of the countdown. Returns feedback when the timer hits zero.
  /// No-op outside a quiz question awaiting an answer.
  pub fn tick(&mut self) -> Option<AnswerFeedback> {
    if self.mode.is_practice() || self.phase != Phase::AwaitingAnswer {
      return None;
    }
    self.time_left = self.time_left.saturating_sub(1);
    if self.time_left == 0 {
      Some(self.judge(false, 0, String::new(), true))
    } else {
      None
    }
  }

  /// Force the timeout path immediately (quiz only).
  pub fn time_out(&mut self) -> Result<AnswerFeedback, SessionError> {
    if self.mode.is_practice() {
      return Err(SessionError::NoTimer);
    }
    if self.phase != Phase::AwaitingAnswer {
      return Err(SessionError::NotAwaitingAnswer);
    }
    self.time_left = 0;
    Ok(self.judge(false, 0, String::new(), true))
  }

  fn judge(&mut self, correct: bool, time_remaining: u32, user_answer: String, timed_out: bool) -> AnswerFeedback {
    let change: ScoreChange =
      scoring::on_answer(&self.rules, self.mode, correct, time_remaining, self.time_budget, self.level);
    let (score, level) = change.apply(self.score, self.level);
    self.score = score;
    self.level = level;
    self.answered += 1;

    if correct {
      self.correct_streak += 1;
      self.best_streak = self.best_streak.max(self.correct_streak);
    } else {
      self.correct_streak = 0;
      self.mistakes.push(Mistake {
        question_text: self.question.text.clone(),
        user_answer: user_answer.clone(),
        correct_answer: self.question.answer,
        operation: self.operation,
      });
    }

    let fb = AnswerFeedback {
      correct,
      timed_out,
      question_text: self.question.text.clone(),
      correct_answer: self.question.answer,
      user_answer,
      score_delta: change.score_delta,
      level_delta: change.level_delta,
      score: self.score,
      level: self.level,
      streak: self.correct_streak,
    };
    debug!(target: "quiz", index = self.question_index, correct, timed_out, score = self.score, level = self.level, streak = self.correct_streak, "Answer judged");
    self.phase = Phase::Feedback(fb.clone());
    fb
  }

  /// Leave feedback: either the next question or, after the last quiz
  /// question, the completed round.
  pub fn proceed(&mut self) -> Result<Advance, SessionError> {
    if !matches!(self.phase, Phase::Feedback(_)) {
      return Err(SessionError::NotInFeedback);
    }
    self.question_index += 1;

    if self.mode == Mode::Quiz && self.question_index > self.rules.questions_per_round {
      let summary = self.summary();
      debug!(target: "quiz", player = %summary.player.name, score = summary.score, level = summary.player.level, mistakes = summary.mistakes.len(), "Round complete");
      self.phase = Phase::Complete(summary.clone());
      return Ok(Advance::Complete(summary));
    }

    self.load_question();
    Ok(Advance::Next(self.question_view()))
  }

  fn summary(&self) -> RoundSummary {
    let topics: BTreeSet<Operation> = self.mistakes.iter().map(|m| m.operation).collect();
    RoundSummary {
      score: self.score,
      player: Player { name: self.player.name.clone(), level: self.level },
      mistakes: self.mistakes.clone(),
      total_questions: self.rules.questions_per_round,
      practice_topics: topics.into_iter().collect(),
    }
  }

  /// Totals for a practice session that is being ended.
  pub fn practice_report(&self) -> Result<PracticeReport, SessionError> {
    match self.mode {
      Mode::Practice(operation) => Ok(PracticeReport {
        operation,
        answered: self.answered,
        correct: self.answered - self.mistakes.len(),
        streak: self.correct_streak,
        best_streak: self.best_streak,
      }),
      Mode::Quiz => Err(SessionError::NotPractice),
    }
  }

  pub fn question_view(&self) -> QuestionView {
    let quiz = self.mode == Mode::Quiz;
    QuestionView {
      index: self.question_index,
      total: quiz.then_some(self.rules.questions_per_round),
      text: self.question.text.clone(),
      operation: self.operation,
      time_budget: quiz.then_some(self.time_budget),
      level: self.level,
      score: self.score,
      streak: self.correct_streak,
      mode: self.mode,
    }
  }

  pub fn phase(&self) -> &Phase { &self.phase }
  pub fn mode(&self) -> Mode { self.mode }
  pub fn player(&self) -> &Player { &self.player }
  pub fn level(&self) -> u32 { self.level }
  pub fn score(&self) -> u32 { self.score }
  pub fn question_index(&self) -> usize { self.question_index }
  pub fn operation_queue(&self) -> &[Operation] { &self.operation_queue }
  pub fn mistakes(&self) -> &[Mistake] { &self.mistakes }
  pub fn correct_streak(&self) -> u32 { self.correct_streak }
  pub fn current_question(&self) -> &Question { &self.question }
  pub fn current_operation(&self) -> Operation { self.operation }
  pub fn time_budget(&self) -> u32 { self.time_budget }
  pub fn time_left(&self) -> u32 { self.time_left }

  pub fn is_awaiting_answer(&self) -> bool {
    self.phase == Phase::AwaitingAnswer
  }

  /// True while a quiz question is counting down.
  pub fn timer_running(&self) -> bool {
    self.mode == Mode::Quiz && self.is_awaiting_answer()
  }

  pub fn is_complete(&self) -> bool {
    matches!(self.phase, Phase::Complete(_))
  }
}
