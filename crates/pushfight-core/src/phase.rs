//! Phase-driver logic: the pure computation each phase performs, decoupled
//! from file I/O so it can be tested against in-memory fakes.
//!
//! Reference: the original solver's `solve-rN.cc` (odd/even phase
//! computation) and `backpropagate-losses.cc` (even-phase back-propagation).

use crate::perm::{Perm, PositionType};
use crate::search::{generate_successors, has_winning_move};
use crate::types::Outcome;

/// Read-only access to a prior phase's stored outcomes, addressed by global
/// permutation rank. Implemented by [`crate::storage::rn::RnFile`] in
/// production and by plain closures/slices in tests.
pub trait PriorOutcomes {
    fn get(&self, i: i64) -> Outcome;
}

impl<F: Fn(i64) -> Outcome> PriorOutcomes for F {
    fn get(&self, i: i64) -> Outcome {
        self(i)
    }
}

/// Per-chunk bookkeeping, merged across worker threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Positions whose prior outcome was already decisive and were kept
    /// unchanged.
    pub kept: i64,
    /// Positions recomputed from `Tie` to the expected decisive outcome.
    pub changed: i64,
    /// Positions recomputed and still `Tie`.
    pub unchanged: i64,
}

impl ChunkStats {
    pub fn merge(&mut self, other: ChunkStats) {
        self.kept += other.kept;
        self.changed += other.changed;
        self.unchanged += other.unchanged;
    }
}

/// Computes a single position's outcome for an odd/odd-style phase with
/// expected outcome `expected` (the outcome a position can transition *to*
/// this phase — `Loss` for odd phases, `Win` for even phases run this way).
/// Every successor of `perm` must already have a decisive outcome in
/// `prior`, or be itself a push that ends the game immediately.
pub fn compute_position(perm: &Perm, expected: Outcome, prior: &dyn PriorOutcomes) -> Outcome {
    match expected {
        Outcome::Loss => {
            // A position is a loss iff every successor is a win for the
            // opponent; abort (return Tie) at the first non-winning one.
            let mut all_winning_for_opponent = true;
            generate_successors(perm, &mut |_moves, succ, outcome| {
                debug_assert_eq!(outcome, Outcome::Tie, "decisive pushes are filtered before calling compute_position");
                let o = prior.get(succ.rank());
                debug_assert_ne!(o, Outcome::Loss);
                if o != Outcome::Win {
                    all_winning_for_opponent = false;
                    false
                } else {
                    true
                }
            });
            if all_winning_for_opponent {
                Outcome::Loss
            } else {
                Outcome::Tie
            }
        }
        Outcome::Win => {
            // A position is a win iff some successor is a loss for the
            // opponent; abort (return Win) at the first one found.
            let mut found_losing_successor = false;
            generate_successors(perm, &mut |_moves, succ, outcome| {
                debug_assert_eq!(outcome, Outcome::Tie);
                let o = prior.get(succ.rank());
                if o == Outcome::Loss {
                    found_losing_successor = true;
                    false
                } else {
                    true
                }
            });
            if found_losing_successor {
                Outcome::Win
            } else {
                Outcome::Tie
            }
        }
        Outcome::Tie => panic!("a phase's expected outcome is always Win or Loss"),
    }
}

/// Computes positions `start..start+len`, consulting `current(i)` for each
/// position's pre-phase outcome and `prior` for successor lookups.
pub fn compute_chunk_range(
    start: i64,
    len: i64,
    expected: Outcome,
    current: impl Fn(i64) -> Outcome,
    prior: &dyn PriorOutcomes,
) -> (Vec<Outcome>, ChunkStats) {
    let mut outcomes = Vec::with_capacity(len as usize);
    let mut stats = ChunkStats::default();
    let mut perm = Perm::unrank(start);
    for offset in 0..len {
        let index = start + offset;
        let existing = current(index);
        let o = if matches!(existing, Outcome::Win | Outcome::Loss) {
            stats.kept += 1;
            existing
        } else {
            let computed = compute_position(&perm, expected, prior);
            if computed == Outcome::Tie {
                stats.unchanged += 1;
            } else {
                debug_assert_eq!(computed, expected);
                stats.changed += 1;
            }
            computed
        };
        outcomes.push(o);
        if offset + 1 < len {
            perm.advance();
        }
    }
    (outcomes, stats)
}

/// Phase 0: for each position, true iff white has an immediate winning move.
pub fn compute_phase0_range(start: i64, len: i64) -> Vec<bool> {
    let mut bits = Vec::with_capacity(len as usize);
    let mut perm = Perm::unrank(start);
    for offset in 0..len {
        bits.push(has_winning_move(&perm));
        if offset + 1 < len {
            perm.advance();
        }
    }
    bits
}

/// Even-phase back-propagation: for every newly-lost position (by rank),
/// enumerates predecessors and reports any that are currently `Tie` as newly
/// winning, via `on_new_win`. Predecessor candidates that are not
/// `InProgress` (the generator's documented superset) are skipped.
pub fn back_propagate_losses(
    new_loss_ranks: impl IntoIterator<Item = i64>,
    current: impl Fn(i64) -> Outcome,
    mut on_new_win: impl FnMut(i64),
) {
    for loss_rank in new_loss_ranks {
        let perm = Perm::unrank(loss_rank);
        crate::search::generate_predecessors(&perm, &mut |pred| {
            if pred.classify() != PositionType::InProgress {
                return;
            }
            let pred_rank = pred.rank();
            if current(pred_rank) == Outcome::Tie {
                on_new_win(pred_rank);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PART_SIZE;

    #[test]
    fn compute_chunk_range_keeps_decisive_positions() {
        let prior = |_i: i64| Outcome::Win;
        let current = |i: i64| if i == 5 { Outcome::Win } else { Outcome::Tie };
        let (_outcomes, stats) = compute_chunk_range(0, 8, Outcome::Loss, current, &prior);
        assert_eq!(stats.kept, 1);
    }

    #[test]
    fn phase0_range_has_expected_length() {
        let bits = compute_phase0_range(0, 64);
        assert_eq!(bits.len(), 64);
    }

    #[test]
    fn part_size_is_a_sane_chunk_subrange() {
        assert!(PART_SIZE > 0);
    }
}
