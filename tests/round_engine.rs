use math_master::config::GameRules;
use math_master::domain::{Operation, Player};
use math_master::question::parse_text;
use math_master::rng::game_rng;
use math_master::session::{Advance, Phase, RoundSession, SessionError};

fn quiz(level: u32, seed: u64) -> RoundSession {
  RoundSession::quiz(Player::new("Ada", level), GameRules::default(), game_rng(Some(seed)))
}

/// Recompute the answer from the displayed text, the way a player would.
fn solve(text: &str) -> i64 {
  let (a, op, b) = parse_text(text).expect("question text parses");
  match op {
    Operation::Addition => a + b,
    Operation::Subtraction => a - b,
    Operation::Multiplication => a * b,
    Operation::Division => a / b,
  }
}

#[test]
fn all_fast_correct_round_gains_twenty_levels() {
  for start in [1u32, 4, 13] {
    let mut s = quiz(start, u64::from(start));
    let mut last = None;
    while last.is_none() {
      let answer = solve(&s.current_question().text).to_string();
      let fb = s.submit(&answer).unwrap();
      assert!(fb.correct);
      assert_eq!(fb.level_delta, 2);
      if let Advance::Complete(summary) = s.proceed().unwrap() {
        last = Some(summary);
      }
    }
    let summary = last.unwrap();
    assert_eq!(summary.player.level, start + 20);
    assert!(summary.score > 0);
    assert!(summary.mistakes.is_empty());
    assert!(summary.practice_topics.is_empty());
    assert_eq!(summary.total_questions, 10);
    assert!(matches!(s.phase(), Phase::Complete(_)));
  }
}

#[test]
fn timeout_on_first_question_records_one_mistake() {
  let mut s = quiz(6, 21);
  let expected = s.current_question().clone();
  let budget = s.time_budget();
  let mut feedback = None;
  for _ in 0..budget {
    if let Some(fb) = s.tick() {
      feedback = Some(fb);
    }
  }
  let fb = feedback.expect("timer reaches zero within the budget");
  assert!(fb.timed_out);
  assert_eq!(s.mistakes().len(), 1);
  let m = &s.mistakes()[0];
  assert_eq!(m.user_answer, "");
  assert_eq!(m.question_text, expected.text);
  assert_eq!(m.correct_answer, expected.answer);
  assert_eq!(s.level(), 5);
  assert_eq!(s.score(), 0);
}

#[test]
fn timeout_at_level_one_stays_at_one() {
  let mut s = quiz(1, 2);
  s.time_out().unwrap();
  assert_eq!(s.level(), 1);
  assert_eq!(s.mistakes().len(), 1);
}

#[test]
fn penalty_clamps_score_at_zero() {
  let mut s = quiz(5, 33);
  // Slow correct answer: budget 11, answered with 1s left.
  for _ in 0..10 {
    s.tick();
  }
  let answer = s.current_question().answer.to_string();
  let gained = s.submit(&answer).unwrap().score_delta;
  assert_eq!(gained, 10 + 2 * 5 + 1);
  assert_eq!(s.level(), 6);
  s.proceed().unwrap();

  // Penalties shrink as the level drops: 8 at level 6, then 7, then 7.
  for expected in [13u32, 6, 0] {
    s.time_out().unwrap();
    assert_eq!(s.score(), expected);
    s.proceed().unwrap();
  }
  assert_eq!(s.mistakes().len(), 3);
}

#[test]
fn practice_never_moves_score_or_level() {
  let mut s = RoundSession::practice(Player::new("Bo", 7), Operation::Multiplication, GameRules::default(), game_rng(Some(4)));
  let pattern = [true, true, false, true, true, true, false, false, true];
  let mut expected_streak = 0;
  for (i, correct) in pattern.into_iter().enumerate() {
    let truth = s.current_question().answer;
    let answer = if correct { truth } else { truth + 1 };
    let fb = s.submit(&answer.to_string()).unwrap();
    expected_streak = if correct { expected_streak + 1 } else { 0 };
    assert_eq!(fb.streak, expected_streak, "after answer {i}");
    assert_eq!((fb.score_delta, fb.level_delta), (0, 0));
    assert_eq!(s.score(), 0);
    assert_eq!(s.level(), 7);
    assert!(matches!(s.proceed().unwrap(), Advance::Next(_)));
    assert_eq!(s.current_operation(), Operation::Multiplication);
  }
  assert_eq!(s.mistakes().len(), 3);
  assert_eq!(s.question_index(), pattern.len() + 1);
  let report = s.practice_report().unwrap();
  assert_eq!(report.best_streak, 3);
  assert_eq!(report.correct, 6);
}

#[test]
fn rejected_input_keeps_the_question_open() {
  let mut s = quiz(2, 8);
  for bad in ["", "  ", "abc", "4.5", "1e3"] {
    assert!(matches!(s.submit(bad), Err(SessionError::EmptyAnswer | SessionError::NotANumber(_))));
  }
  assert!(s.is_awaiting_answer());
  assert!(s.mistakes().is_empty());
  let answer = format!("  {}  ", s.current_question().answer);
  assert!(s.submit(&answer).unwrap().correct);
}

#[test]
fn questions_follow_the_composed_queue() {
  let mut s = quiz(3, 77);
  let queue = s.operation_queue().to_vec();
  for (i, op) in queue.iter().enumerate() {
    assert_eq!(s.question_index(), i + 1);
    assert_eq!(s.current_operation(), *op);
    let (_, shown, _) = parse_text(&s.current_question().text).unwrap();
    assert_eq!(shown, *op);
    s.time_out().unwrap();
    s.proceed().unwrap();
  }
  assert!(s.is_complete());
}
