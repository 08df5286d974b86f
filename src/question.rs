//! Level-scaled arithmetic problem generation.
//!
//! Operand ranges grow with the level; every range is built so that
//! `min <= max` for any level >= 1, so generation cannot fail.

use rand::Rng;

use crate::domain::{Operation, Question};
use crate::rng::random_int;

/// Generate one question. Uses `forced` when given, otherwise picks an
/// operation uniformly. Returns the operation actually used.
pub fn generate<R: Rng + ?Sized>(
  level: u32,
  forced: Option<Operation>,
  rng: &mut R,
) -> (Question, Operation) {
  let operation = forced.unwrap_or_else(|| Operation::ALL[rng.gen_range(0..Operation::ALL.len())]);
  let level = i64::from(level.max(1));

  let (a, b, answer) = match operation {
    Operation::Addition => {
      let a = random_int(rng, 10 + level, 20 + level * 5);
      let b = random_int(rng, 10 + level, 20 + level * 3);
      (a, b, a + b)
    }
    Operation::Subtraction => {
      let minuend = random_int(rng, 20 + level * 2, 50 + level * 5);
      // Result is always >= 10.
      let subtrahend = random_int(rng, 10, minuend - 10);
      (minuend, subtrahend, minuend - subtrahend)
    }
    Operation::Multiplication => {
      let big = random_int(rng, 11 + level, 50 + level * 4);
      let small = random_int(rng, 3, 9);
      // Display order only.
      if rng.gen_bool(0.5) { (small, big, big * small) } else { (big, small, big * small) }
    }
    Operation::Division => {
      let divisor = random_int(rng, 2, 9);
      let quotient = random_int(rng, 5 + level, 15 + level * 2);
      (divisor * quotient, divisor, quotient)
    }
  };

  let text = format!("{} {} {}", a, operation.symbol(), b);
  (Question { text, answer }, operation)
}

/// Parse a rendered question back into `(lhs, operation, rhs)`.
pub fn parse_text(text: &str) -> Option<(i64, Operation, i64)> {
  let mut parts = text.split_whitespace();
  let lhs = parts.next()?.parse::<i64>().ok()?;
  let sym = parts.next()?;
  let rhs = parts.next()?.parse::<i64>().ok()?;
  if parts.next().is_some() {
    return None;
  }
  let op = Operation::ALL.into_iter().find(|op| op.symbol() == sym)?;
  Some((lhs, op, rhs))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rng::game_rng;

  fn evaluate(text: &str) -> i64 {
    let (a, op, b) = parse_text(text).expect("well-formed question text");
    match op {
      Operation::Addition => a + b,
      Operation::Subtraction => a - b,
      Operation::Multiplication => a * b,
      Operation::Division => {
        assert_eq!(a % b, 0, "division must be exact: {text}");
        a / b
      }
    }
  }

  #[test]
  fn answer_matches_displayed_expression() {
    let mut rng = game_rng(Some(42));
    for level in [1u32, 2, 5, 10, 25, 60, 150] {
      for op in Operation::ALL {
        for _ in 0..50 {
          let (q, used) = generate(level, Some(op), &mut rng);
          assert_eq!(used, op);
          assert_eq!(evaluate(&q.text), q.answer, "level {level}: {}", q.text);
        }
      }
    }
  }

  #[test]
  fn subtraction_never_goes_below_ten() {
    let mut rng = game_rng(Some(3));
    for level in 1..=40 {
      for _ in 0..25 {
        let (q, _) = generate(level, Some(Operation::Subtraction), &mut rng);
        let (a, _, b) = parse_text(&q.text).unwrap();
        assert!(b >= 10);
        assert!(q.answer >= 10);
        assert!(a >= 20 + 2 * i64::from(level));
      }
    }
  }

  #[test]
  fn operand_ranges_follow_level() {
    let mut rng = game_rng(Some(11));
    let level = 7u32;
    let l = i64::from(level);
    for _ in 0..200 {
      let (q, _) = generate(level, Some(Operation::Addition), &mut rng);
      let (a, _, b) = parse_text(&q.text).unwrap();
      assert!((10 + l..=20 + l * 5).contains(&a));
      assert!((10 + l..=20 + l * 3).contains(&b));

      let (q, _) = generate(level, Some(Operation::Multiplication), &mut rng);
      let (a, _, b) = parse_text(&q.text).unwrap();
      let (big, small) = if a >= b { (a, b) } else { (b, a) };
      assert!((11 + l..=50 + l * 4).contains(&big));
      assert!((3..=9).contains(&small));

      let (q, _) = generate(level, Some(Operation::Division), &mut rng);
      let (_, _, divisor) = parse_text(&q.text).unwrap();
      assert!((2..=9).contains(&divisor));
      assert!((5 + l..=15 + l * 2).contains(&q.answer));
    }
  }

  #[test]
  fn random_operation_is_reported() {
    let mut rng = game_rng(Some(5));
    let mut seen = std::collections::HashSet::new();
    for _ in 0..200 {
      let (q, op) = generate(3, None, &mut rng);
      let (_, parsed, _) = parse_text(&q.text).unwrap();
      assert_eq!(parsed, op);
      seen.insert(op);
    }
    assert_eq!(seen.len(), 4);
  }

  #[test]
  fn multiplication_swaps_operands_sometimes() {
    let mut rng = game_rng(Some(9));
    let mut small_first = false;
    let mut big_first = false;
    for _ in 0..100 {
      let (q, _) = generate(1, Some(Operation::Multiplication), &mut rng);
      let (a, _, b) = parse_text(&q.text).unwrap();
      small_first |= a < b;
      big_first |= a > b;
    }
    assert!(small_first && big_first);
  }

  #[test]
  fn parse_text_rejects_garbage() {
    assert!(parse_text("1 + ").is_none());
    assert!(parse_text("1 ? 2").is_none());
    assert!(parse_text("1 + 2 + 3").is_none());
    assert_eq!(parse_text("84 ÷ 7"), Some((84, Operation::Division, 7)));
  }
}
