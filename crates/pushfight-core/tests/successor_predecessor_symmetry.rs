//! Cross-checks the reverse direction of successor/predecessor symmetry:
//! for sampled positions `p`, every `InProgress` candidate yielded by
//! `generate_predecessors(p)` must list `p` among its own successors.
//!
//! The forward direction (a successor's predecessor set contains the
//! original position) is already covered in-crate, alongside the search
//! kernel it exercises.

use pushfight_core::perm::{Perm, PositionType};
use pushfight_core::search::{generate_predecessors, generate_successors};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[test]
fn every_predecessor_candidates_successor_set_contains_the_original() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut checked_positions = 0;
    while checked_positions < 15 {
        let idx = rng.random_range(0..pushfight_core::constants::TOTAL_PERMS);
        let p = Perm::unrank(idx);
        let mut any_predecessor = false;
        generate_predecessors(&p, &mut |pred| {
            if pred.classify() != PositionType::InProgress {
                return;
            }
            any_predecessor = true;
            let mut found = false;
            generate_successors(pred, &mut |_moves, succ, _outcome| {
                if succ == &p {
                    found = true;
                    return false;
                }
                true
            });
            assert!(
                found,
                "predecessor candidate must have the original position as a successor"
            );
        });
        if any_predecessor {
            checked_positions += 1;
        }
    }
}
