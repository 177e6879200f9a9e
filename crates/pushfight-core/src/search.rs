//! The search kernel: successor/predecessor enumeration and the bounded
//! immediate-win probe.
//!
//! Reference: the original solver's `search.cc`. `generate_predecessors`
//! follows the complete contract documented alongside it (reverse the push,
//! then back-generate 0–2 white moves) rather than the original's
//! `GeneratePredecessors`, which only reverses the push and is marked
//! incomplete in its own comments.

use crate::board::{execute_push, is_valid_push, step};
use crate::constants::{DANGER_POSITIONS, L};
use crate::moves::Moves;
use crate::perm::Perm;
use crate::piece::Piece;
use crate::types::Outcome;

/// Enumerates every successor of `perm`: 0, 1, or 2 white piece moves
/// followed by a push, calling `callback(moves, successor, outcome)` for
/// each. `outcome` is from the mover's perspective for this one ply (a push
/// that ejects a piece is decisive; otherwise `Tie`, meaning "no immediate
/// decision, recurse on the resulting position"). Stops early and returns
/// `false` the moment `callback` returns `false`.
pub fn generate_successors(
    perm: &Perm,
    callback: &mut dyn FnMut(&Moves, &Perm, Outcome) -> bool,
) -> bool {
    let mut working = *perm;
    let mut moves = Moves::new();
    for moves_left in 0..=2 {
        if !generate_successors_rec(&mut working, &mut moves, moves_left, callback) {
            return false;
        }
    }
    true
}

fn generate_successors_rec(
    perm: &mut Perm,
    moves: &mut Moves,
    moves_left: u32,
    callback: &mut dyn FnMut(&Moves, &Perm, Outcome) -> bool,
) -> bool {
    if moves_left > 0 {
        for i0 in 0..L as u8 {
            let piece = perm.get(i0 as usize);
            if !matches!(piece, Piece::WhiteMover | Piece::WhitePusher) {
                continue;
            }
            // Never move the same piece twice in one turn.
            if moves.last_destination() == Some(i0) {
                continue;
            }
            let mut visited: u32 = 1 << i0;
            let mut queue = arrayvec::ArrayVec::<u8, L>::new();
            queue.push(i0);
            let mut j = 0;
            while j < queue.len() {
                let i1 = queue[j];
                j += 1;
                for d in 0..4 {
                    let Some(i2) = step(i1, d) else { continue };
                    if perm.get(i2 as usize) != Piece::Empty || visited & (1 << i2) != 0 {
                        continue;
                    }
                    visited |= 1 << i2;
                    queue.push(i2);

                    moves.push((i0, i2));
                    let tmp = perm.get(i0 as usize);
                    perm.set(i0 as usize, perm.get(i2 as usize));
                    perm.set(i2 as usize, tmp);

                    if !generate_successors_rec(perm, moves, moves_left - 1, callback) {
                        return false;
                    }

                    let tmp = perm.get(i0 as usize);
                    perm.set(i0 as usize, perm.get(i2 as usize));
                    perm.set(i2 as usize, tmp);
                    moves.pop();
                }
            }
        }
    } else {
        for i in 0..L as u8 {
            if perm.get(i as usize) != Piece::WhitePusher {
                continue;
            }
            for d in 0..4 {
                if !is_valid_push(perm, i, d) {
                    continue;
                }
                let Some(to) = step(i, d) else { continue };
                moves.push((i, to));

                let mut successor = *perm;
                let outcome = execute_push(&mut successor, i, d);

                if !callback(moves, &successor, outcome) {
                    return false;
                }
                moves.pop();
            }
        }
    }
    true
}

/// Deduplicates successors that lead to the same resulting [`Perm`],
/// keeping one entry per distinct position.
pub fn deduplicate(successors: &mut Vec<(Moves, Perm, Outcome)>) {
    successors.sort_by(|a, b| a.1.as_raw().cmp(b.1.as_raw()));
    successors.dedup_by(|a, b| a.1 == b.1);
}

/// Enumerates candidate predecessors of `perm`: for each anchor, reverse the
/// push chain, then for every resulting black-pusher cell, treat it as the
/// pre-push anchor and back-generate 0–2 preceding white moves. The
/// generated set is a superset of legal predecessors; some candidates may be
/// unreachable and must be filtered by the consumer.
pub fn generate_predecessors(perm: &Perm, callback: &mut dyn FnMut(&Perm)) {
    for anchor in 0..L as u8 {
        if perm.get(anchor as usize) != Piece::BlackAnchor {
            continue;
        }
        for d in 0..4 {
            let Some(unpushed) = reverse_push(perm, anchor, d) else {
                continue;
            };
            generate_predecessor_moves(&unpushed, callback);
        }
    }
}

/// Best-effort reachability check: `true` if the position's anchor placement
/// is consistent with some legal last push, i.e. there is some direction
/// along which the anchor has an empty cell ahead and an occupied cell
/// behind (the documented, acknowledged-incomplete "rule 1"/"rule 2" test;
/// see the module-level reference). A position must be `InProgress` (have
/// exactly one anchor) for this to be meaningful.
pub fn is_reachable(perm: &Perm) -> bool {
    use crate::constants::{board_index, FIELD_COL, FIELD_ROW};

    for anchor in 0..L as u8 {
        if perm.get(anchor as usize) != Piece::BlackAnchor {
            continue;
        }
        let row = FIELD_ROW[anchor as usize] as i32;
        let col = FIELD_COL[anchor as usize] as i32;
        for d in 0..4 {
            let dr = crate::constants::DR[d] as i32;
            let dc = crate::constants::DC[d] as i32;
            let Some(ahead) = board_index(row + dr, col + dc) else {
                continue;
            };
            if perm.get(ahead as usize) != Piece::Empty {
                continue;
            }
            let Some(behind) = board_index(row - dr, col - dc) else {
                continue;
            };
            if perm.get(behind as usize) != Piece::Empty {
                return true;
            }
        }
    }
    false
}

/// Reverses the push that placed the anchor at `anchor`, coming from
/// direction `d`: requires an empty cell ahead (where the anchor's target
/// would be once un-pushed back) and an occupied cell behind (the chain that
/// was pushed). Returns the un-pushed, un-flipped candidate (still flipped
/// back to the mover's color) with the anchor replaced by an unanchored
/// black pusher, or `None` if this anchor/direction combination is
/// impossible.
fn reverse_push(perm: &Perm, anchor: u8, d: usize) -> Option<Perm> {
    use crate::constants::{board_index, FIELD_COL, FIELD_ROW};

    let row = FIELD_ROW[anchor as usize] as i32;
    let col = FIELD_COL[anchor as usize] as i32;
    let dr = crate::constants::DR[d] as i32;
    let dc = crate::constants::DC[d] as i32;

    let ahead = board_index(row + dr, col + dc)?;
    if perm.get(ahead as usize) != Piece::Empty {
        return None;
    }
    let behind = board_index(row - dr, col - dc)?;
    if perm.get(behind as usize) == Piece::Empty {
        return None;
    }

    // Flip colors: the anchor (black) becomes a plain white pusher, in line
    // with how the push inverted colors going forward.
    let mut unpushed = Perm::from_raw(*perm.as_raw());
    for j in 0..L {
        unpushed.set(j, perm.get(j).inverse());
    }

    // Shift the pushed chain back by one cell: the field ahead inherits the
    // anchor's (flipped) value, the anchor inherits the field behind it, and
    // so on, until the chain runs off the board or hits an empty cell, which
    // becomes the new trailing empty cell.
    unpushed.set(ahead as usize, unpushed.get(anchor as usize));
    let mut dst = anchor;
    let mut src = behind;
    let mut src_row = row - dr;
    let mut src_col = col - dc;
    loop {
        unpushed.set(dst as usize, unpushed.get(src as usize));
        dst = src;
        src_row -= dr;
        src_col -= dc;
        match board_index(src_row, src_col) {
            Some(next) if unpushed.get(next as usize) != Piece::Empty => {
                src = next;
            }
            _ => break,
        }
    }
    unpushed.set(dst as usize, Piece::Empty);
    Some(unpushed)
}

/// Given a position with the anchor removed (an un-pushed, un-flipped
/// candidate), enumerates 0–2 preceding white moves for every black-pusher
/// cell (the candidate pre-push anchor), re-adding the anchor and invoking
/// `callback` for each result.
fn generate_predecessor_moves(base: &Perm, callback: &mut dyn FnMut(&Perm)) {
    for candidate in 0..L as u8 {
        if base.get(candidate as usize) != Piece::BlackPusher {
            continue;
        }
        let mut working = *base;
        working.set(candidate as usize, Piece::BlackAnchor);
        back_generate_moves(&mut working, 0, callback);
    }
}

fn back_generate_moves(perm: &mut Perm, moves_made: u32, callback: &mut dyn FnMut(&Perm)) {
    callback(perm);
    if moves_made >= 2 {
        return;
    }
    for i0 in 0..L as u8 {
        if !matches!(perm.get(i0 as usize), Piece::WhiteMover | Piece::WhitePusher) {
            continue;
        }
        let mut visited: u32 = 1 << i0;
        let mut queue = arrayvec::ArrayVec::<u8, L>::new();
        queue.push(i0);
        let mut j = 0;
        while j < queue.len() {
            let i1 = queue[j];
            j += 1;
            for d in 0..4 {
                let Some(i2) = step(i1, d) else { continue };
                if perm.get(i2 as usize) != Piece::Empty || visited & (1 << i2) != 0 {
                    continue;
                }
                visited |= 1 << i2;
                queue.push(i2);

                let tmp = perm.get(i0 as usize);
                perm.set(i0 as usize, perm.get(i2 as usize));
                perm.set(i2 as usize, tmp);

                back_generate_moves(perm, moves_made + 1, callback);

                let tmp = perm.get(i0 as usize);
                perm.set(i0 as usize, perm.get(i2 as usize));
                perm.set(i2 as usize, tmp);
            }
        }
    }
}

/// A bounded probe for whether white has an immediate winning move: either a
/// black piece in danger can be pushed off right now, or can be reached
/// within up to two piece moves followed by such a push.
pub fn has_winning_move(perm: &Perm) -> bool {
    let mut danger = arrayvec::ArrayVec::<u8, { DANGER_POSITIONS.len() }>::new();
    for &i in &DANGER_POSITIONS {
        if matches!(perm.get(i as usize), Piece::BlackMover | Piece::BlackPusher) {
            danger.push(i);
        }
    }
    if danger.is_empty() {
        return false;
    }
    let mut working = *perm;
    has_winning_move_rec(&danger, &mut working, 2, None)
}

fn has_winning_move_rec(danger: &[u8], perm: &mut Perm, moves_left: u32, last_move: Option<u8>) -> bool {
    use crate::constants::{board_index, BOARD_H, BOARD_W, FIELD_COL, FIELD_ROW};

    for &p in danger {
        let row = FIELD_ROW[p as usize] as i32;
        let col = FIELD_COL[p as usize] as i32;
        for d in 0..4 {
            let dr = crate::constants::DR[d] as i32;
            let dc = crate::constants::DC[d] as i32;
            let runs_off_edge = row + dr >= 0
                && row + dr < BOARD_H as i32
                && (col + dc < 0
                    || col + dc >= BOARD_W as i32
                    || crate::constants::board_index(row + dr, col + dc).is_none());
            if !runs_off_edge {
                continue;
            }
            let mut r = row;
            let mut c = col;
            loop {
                r -= dr;
                c -= dc;
                match board_index(r, c) {
                    None => break,
                    Some(i) => match perm.get(i as usize) {
                        Piece::BlackAnchor | Piece::Empty => break,
                        Piece::WhitePusher => return true,
                        _ => {}
                    },
                }
            }
        }
    }

    if moves_left > 0 {
        for i0 in 0..L as u8 {
            if !matches!(perm.get(i0 as usize), Piece::WhiteMover | Piece::WhitePusher) {
                continue;
            }
            if last_move == Some(i0) {
                continue;
            }
            let mut visited: u32 = 1 << i0;
            let mut queue = arrayvec::ArrayVec::<u8, L>::new();
            queue.push(i0);
            let mut j = 0;
            while j < queue.len() {
                let i1 = queue[j];
                j += 1;
                for d in 0..4 {
                    let Some(i2) = step(i1, d) else { continue };
                    if perm.get(i2 as usize) != Piece::Empty || visited & (1 << i2) != 0 {
                        continue;
                    }
                    visited |= 1 << i2;
                    queue.push(i2);

                    let tmp = perm.get(i0 as usize);
                    perm.set(i0 as usize, perm.get(i2 as usize));
                    perm.set(i2 as usize, tmp);

                    let found = has_winning_move_rec(danger, perm, moves_left - 1, Some(i2));

                    let tmp = perm.get(i0 as usize);
                    perm.set(i0 as usize, perm.get(i2 as usize));
                    perm.set(i2 as usize, tmp);

                    if found {
                        return true;
                    }
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_successors_collects_at_least_one_push_from_the_opening_position() {
        let mut count = 0;
        generate_successors(&Perm::FIRST, &mut |_moves, _succ, _outcome| {
            count += 1;
            true
        });
        assert!(count > 0);
    }

    #[test]
    fn early_abort_stops_enumeration() {
        let mut count = 0;
        generate_successors(&Perm::FIRST, &mut |_moves, _succ, _outcome| {
            count += 1;
            false
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn has_winning_move_is_false_with_no_black_in_danger() {
        // FIRST has no black piece on a DANGER_POSITIONS cell.
        assert!(!has_winning_move(&Perm::FIRST));
    }

    #[test]
    fn successor_predecessor_round_trip_sampled() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        let mut rng = StdRng::seed_from_u64(5);
        let mut checked = 0;
        while checked < 20 {
            let idx = rng.random_range(0..crate::constants::TOTAL_PERMS);
            let p = Perm::unrank(idx);
            let mut any_non_ejecting = false;
            generate_successors(&p, &mut |_moves, succ, outcome| {
                if outcome == Outcome::Tie {
                    any_non_ejecting = true;
                    let mut found = false;
                    generate_predecessors(succ, &mut |pred| {
                        if pred == &p {
                            found = true;
                        }
                    });
                    assert!(found, "successor's predecessor set must include p");
                }
                true
            });
            if any_non_ejecting {
                checked += 1;
            }
        }
    }
}
