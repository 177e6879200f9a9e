//! Merging per-phase outcomes into a single [`Value`] per position, and
//! collapsing the merged array down to the minimized (reachable,
//! rotation-canonical) index space.
//!
//! Reference: the original solver's `merge-phases.cc` and
//! `minify-merged.cc`.

use crate::constants::TOTAL_PERMS;
use crate::perm::minimized::MinimizedEnumerator;
use crate::types::{Outcome, Value};

/// The value contributed by a position with no legal moves at all (an
/// immediate, zero-ply loss) — computed separately from the phase files, by
/// the original tool's `lost-positions.cc` equivalent.
pub fn value_for_immediately_lost() -> Value {
    Value::loss(0)
}

/// The value contributed by phase 0 (`r0.bin`): a set bit means white has an
/// immediate winning move, i.e. a win in one ply.
pub fn value_for_r0(is_winning: bool) -> Option<Value> {
    is_winning.then(|| Value::win(1))
}

/// The value contributed by reading `outcome` out of an even phase N's
/// ternary file (`N >= 2`, `N` even): `Tie` contributes nothing, `Loss`
/// becomes a loss-in-`N/2`, `Win` becomes a win-in-`(N/2 + 1)`.
pub fn value_for_even_phase(phase: u32, outcome: Outcome) -> Option<Value> {
    debug_assert!(phase >= 2 && phase % 2 == 0);
    match outcome {
        Outcome::Tie => None,
        Outcome::Loss => Some(Value::loss(phase / 2)),
        Outcome::Win => Some(Value::win(phase / 2 + 1)),
    }
}

/// Folds one candidate contribution into a position's accumulated value.
///
/// # Panics
///
/// Panics (in debug builds) if `current` is already decisive and `candidate`
/// is `Some` — every position is decided by exactly one phase, so a second
/// decisive contribution indicates the inputs disagree.
pub fn fold_value(current: Value, candidate: Option<Value>) -> Value {
    match candidate {
        None => current,
        Some(v) => {
            debug_assert_eq!(current, Value::TIE, "position already has a value");
            v
        }
    }
}

/// Collapses a merged per-position value function down to the minimized
/// index space: for every reachable canonical position (in minimized-index
/// order), looks up its merged value by global rank and, if decisive, calls
/// `write(min_index, value)`. Tie positions are left unwritten, matching the
/// zero-initialized output file.
pub fn minify(merged: impl Fn(i64) -> Value, write: impl FnMut(i64, Value)) {
    minify_range(0, TOTAL_PERMS, merged, write)
}

/// Like [`minify`], but only walks global ranks in `[start_rank, end_rank)`.
/// `min_index` still starts at 0, since it's only meaningful relative to a
/// full scan from rank 0 — this is for testing the skip/write logic over a
/// bounded window, not for producing a usable partial `minimized.bin`.
pub fn minify_range(
    start_rank: i64,
    end_rank: i64,
    merged: impl Fn(i64) -> Value,
    mut write: impl FnMut(i64, Value),
) {
    for (perm_rank, min_index, _perm) in MinimizedEnumerator::starting_at(start_rank, 0) {
        if perm_rank >= end_rank {
            break;
        }
        let v = merged(perm_rank);
        if v != Value::TIE {
            write(min_index, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_encoding_matches_documented_byte_table() {
        assert_eq!(value_for_immediately_lost(), Value(1));
        assert_eq!(value_for_r0(true), Some(Value(2)));
        assert_eq!(value_for_r0(false), None);
        assert_eq!(value_for_even_phase(2, Outcome::Loss), Some(Value(3)));
        assert_eq!(value_for_even_phase(2, Outcome::Win), Some(Value(4)));
        assert_eq!(value_for_even_phase(18, Outcome::Loss), Some(Value(19)));
        assert_eq!(value_for_even_phase(18, Outcome::Win), Some(Value(20)));
        assert_eq!(value_for_even_phase(2, Outcome::Tie), None);
    }

    #[test]
    fn fold_value_keeps_the_first_decisive_contribution() {
        let mut v = Value::TIE;
        v = fold_value(v, None);
        assert_eq!(v, Value::TIE);
        v = fold_value(v, Some(Value::win(1)));
        assert_eq!(v, Value::win(1));
    }

    #[test]
    #[should_panic]
    fn fold_value_rejects_a_second_decisive_contribution() {
        let v = Value::win(1);
        fold_value(v, Some(Value::loss(2)));
    }

    #[test]
    fn minify_skips_tie_positions() {
        let mut written = Vec::new();
        minify_range(
            0,
            5_000,
            |_rank| Value::TIE,
            |min_index, value| written.push((min_index, value)),
        );
        assert!(written.is_empty());
    }
}
