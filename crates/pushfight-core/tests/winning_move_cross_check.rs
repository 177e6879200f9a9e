//! Cross-checks phase 0's bounded danger-position probe against the
//! general-purpose successor enumerator: both search the same space (zero,
//! one, or two preliminary white moves followed by a push), via
//! independently written algorithms, so they must agree on every sampled
//! position.

use pushfight_core::perm::Perm;
use pushfight_core::search::{generate_successors, has_winning_move};
use pushfight_core::types::Outcome;
use rand::{Rng, SeedableRng, rngs::StdRng};

#[test]
fn has_winning_move_agrees_with_full_successor_enumeration() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..500 {
        let idx = rng.random_range(0..pushfight_core::constants::TOTAL_PERMS);
        let p = Perm::unrank(idx);

        let mut found_winning_successor = false;
        generate_successors(&p, &mut |_moves, _succ, outcome| {
            if outcome == Outcome::Win {
                found_winning_successor = true;
                return false;
            }
            true
        });

        assert_eq!(
            has_winning_move(&p),
            found_winning_successor,
            "rank {idx} disagreement between has_winning_move and full enumeration"
        );
    }
}
