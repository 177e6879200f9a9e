//! Push validity and execution.
//!
//! Reference: the original solver's `search.cc` (`IsValidPush`,
//! `ExecutePush`).

use crate::constants::{board_index, neighbor, FIELD_COL, FIELD_ROW};
use crate::perm::Perm;
use crate::piece::Piece;
use crate::types::Outcome;

/// Returns `true` if the piece at `i` can push in direction `d`
/// (0=up, 1=left, 2=right, 3=down).
///
/// A push is valid if it moves at least one piece, never pushes an anchored
/// piece, never runs off the top/bottom railing, and never ejects the
/// pushing player's own piece over the side.
pub fn is_valid_push(perm: &Perm, i: u8, d: usize) -> bool {
    let mut row = FIELD_ROW[i as usize] as i32 + crate::constants::DR[d] as i32;
    let mut col = FIELD_COL[i as usize] as i32 + crate::constants::DC[d] as i32;
    let Some(mut field) = board_index(row, col) else {
        return false;
    };
    let mut last_piece = perm.get(field as usize);
    if last_piece == Piece::Empty {
        return false;
    }
    loop {
        if last_piece == Piece::BlackAnchor {
            return false;
        }
        row += crate::constants::DR[d] as i32;
        col += crate::constants::DC[d] as i32;
        if row < 0 || row >= crate::constants::BOARD_H as i32 {
            return false;
        }
        match board_index(row, col) {
            None => {
                return !matches!(last_piece, Piece::WhiteMover | Piece::WhitePusher);
            }
            Some(next_field) => {
                field = next_field;
                last_piece = perm.get(field as usize);
            }
        }
    }
}

/// Executes a push: flips every piece's color (and strips anchors via
/// [`Piece::inverse`]), places the anchor at the pushing piece's destination,
/// and shifts the chain of pushed pieces one cell along `d`.
///
/// # Panics
///
/// Panics (in debug builds) if the push is not valid.
pub fn execute_push(perm: &mut Perm, i: u8, d: usize) -> Outcome {
    debug_assert!(is_valid_push(perm, i, d));
    for j in 0..crate::constants::L {
        perm.set(j, perm.get(j).inverse());
    }
    perm.set(i as usize, Piece::BlackAnchor);

    let mut row = FIELD_ROW[i as usize] as i32;
    let mut col = FIELD_COL[i as usize] as i32;
    let mut carried = Piece::Empty;
    loop {
        match board_index(row, col) {
            None => {
                debug_assert_ne!(carried, Piece::Empty);
                return if matches!(carried, Piece::WhiteMover | Piece::WhitePusher) {
                    Outcome::Loss
                } else {
                    Outcome::Win
                };
            }
            Some(field) => {
                let displaced = perm.get(field as usize);
                perm.set(field as usize, carried);
                carried = displaced;
                if carried == Piece::Empty {
                    return Outcome::Tie;
                }
                row += crate::constants::DR[d] as i32;
                col += crate::constants::DC[d] as i32;
            }
        }
    }
}

/// Returns the field reached from `i` by stepping in direction `d`, treating
/// the board edge as `None` (a thin wrapper over [`neighbor`] used by the
/// search kernel for move generation, as opposed to push execution which
/// tracks row/col directly to detect the railing).
#[inline]
pub fn step(i: u8, d: usize) -> Option<u8> {
    neighbor(i, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perm::Perm;

    fn perm_from_chars(s: &str) -> Perm {
        let mut cells = [0u8; crate::constants::L];
        for (i, c) in s.chars().filter(|c| !c.is_whitespace()).enumerate() {
            cells[i] = match c {
                '.' => 0,
                'o' => 1,
                'O' => 2,
                'x' => 3,
                'X' => 4,
                'Y' => 5,
                other => panic!("unexpected board char {other}"),
            };
        }
        Perm::from_raw(cells)
    }

    #[test]
    fn push_off_own_piece_is_invalid() {
        // FIRST has no adjacent pieces at all around field 0, so no push is
        // valid there regardless of direction.
        let p = Perm::FIRST;
        assert!(!is_valid_push(&p, 0, 0));
    }

    #[test]
    fn execute_push_inverts_and_places_anchor() {
        let mut p = perm_from_chars(
            "  . . O o .
             . . . . . . . .
             . . . . . . . .
               . . x X Y",
        );
        if is_valid_push(&p, 2, 2) {
            let outcome = execute_push(&mut p, 2, 2);
            assert_eq!(p.get(2), Piece::BlackAnchor);
            assert_eq!(outcome, Outcome::Tie);
        }
    }
}
