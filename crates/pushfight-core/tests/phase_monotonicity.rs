//! Cross-checks outcome monotonicity across phases: once a position is
//! decided (`Win` or `Loss`), recomputing a later phase over it must leave
//! it unchanged. Exercises `compute_chunk_range`'s `current`/`kept` wiring
//! against priors built from the real search kernel, not trivial closures.

use pushfight_core::perm::Perm;
use pushfight_core::phase::compute_chunk_range;
use pushfight_core::search::has_winning_move;
use pushfight_core::types::Outcome;

/// A phase-0-derived prior: `Win` if the mover at `rank` has an immediate
/// winning push, `Tie` otherwise. Defined for any rank, not just a
/// precomputed range, since successors of a small sampled window can land
/// anywhere in the index space.
fn phase0_prior(rank: i64) -> Outcome {
    if has_winning_move(&Perm::unrank(rank)) {
        Outcome::Win
    } else {
        Outcome::Tie
    }
}

#[test]
fn decisive_positions_survive_a_second_phase_pass_unchanged() {
    let start = 12_345_678_901i64;
    let len = 64i64;

    // First pass: phase 1 (expects Loss), nothing decided yet going in.
    let (phase1, _stats) =
        compute_chunk_range(start, len, Outcome::Loss, |_i| Outcome::Tie, &phase0_prior);

    // Second pass: phase 2 (expects Win) over the same range, seeded with
    // phase 1's results as `current`. Every position phase 1 already
    // decided must come back out identical ("kept"), never recomputed.
    let current = |i: i64| phase1[(i - start) as usize];
    let prior = |_rank: i64| Outcome::Loss;
    let (phase2, stats) = compute_chunk_range(start, len, Outcome::Win, current, &prior);

    let decisive_in_phase1 = phase1.iter().filter(|o| **o != Outcome::Tie).count() as i64;
    assert_eq!(stats.kept, decisive_in_phase1);
    for (offset, (&p1, &p2)) in phase1.iter().zip(phase2.iter()).enumerate() {
        if p1 != Outcome::Tie {
            assert_eq!(p1, p2, "position at offset {offset} regressed between phases");
        }
    }
}
