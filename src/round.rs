//! Operation mix for a quiz round.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::Operation;

/// Every operation appears at least this many times per round.
pub const GUARANTEED_PER_OPERATION: usize = 2;

/// Smallest round that can honor the per-operation guarantee.
pub const MIN_ROUND_SIZE: usize = GUARANTEED_PER_OPERATION * Operation::ALL.len();

/// Operations available at a given level. Currently all four at every level.
pub fn operations_for_level(_level: u32) -> &'static [Operation] {
  &Operation::ALL
}

/// Build the ordered operation queue for one round of `round_size` questions.
///
/// Each available operation is placed twice, the remainder is filled with
/// uniform draws, and the whole queue is shuffled (Fisher–Yates) so position
/// carries no information. `round_size` below [`MIN_ROUND_SIZE`] still yields
/// the full guaranteed pool.
pub fn compose_round<R: Rng + ?Sized>(level: u32, round_size: usize, rng: &mut R) -> Vec<Operation> {
  let available = operations_for_level(level);

  let mut ops: Vec<Operation> = available
    .iter()
    .flat_map(|op| std::iter::repeat(*op).take(GUARANTEED_PER_OPERATION))
    .collect();

  let remaining = round_size.saturating_sub(ops.len());
  ops.extend((0..remaining).map(|_| available[rng.gen_range(0..available.len())]));

  ops.shuffle(rng);
  ops
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rng::game_rng;
  use std::collections::HashSet;

  fn count(ops: &[Operation], op: Operation) -> usize {
    ops.iter().filter(|o| **o == op).count()
  }

  #[test]
  fn length_equals_round_size() {
    let mut rng = game_rng(Some(1));
    for n in [8usize, 10, 12, 25] {
      assert_eq!(compose_round(1, n, &mut rng).len(), n);
    }
  }

  #[test]
  fn every_operation_at_least_twice() {
    let mut rng = game_rng(Some(2));
    for level in 1..30 {
      let ops = compose_round(level, 10, &mut rng);
      for op in Operation::ALL {
        assert!(count(&ops, op) >= 2, "{op:?} missing in {ops:?}");
      }
    }
  }

  #[test]
  fn minimum_round_is_exactly_the_guaranteed_pool() {
    let mut rng = game_rng(Some(3));
    let ops = compose_round(4, MIN_ROUND_SIZE, &mut rng);
    for op in Operation::ALL {
      assert_eq!(count(&ops, op), 2);
    }
  }

  #[test]
  fn orderings_vary_between_calls() {
    let mut rng = game_rng(Some(4));
    let distinct: HashSet<Vec<Operation>> = (0..20).map(|_| compose_round(1, 10, &mut rng)).collect();
    assert!(distinct.len() > 1);
  }

  #[test]
  fn level_does_not_change_the_mix() {
    let a = compose_round(1, 10, &mut game_rng(Some(99)));
    let b = compose_round(50, 10, &mut game_rng(Some(99)));
    assert_eq!(a, b);
  }
}
