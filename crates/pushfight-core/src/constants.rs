//! Board geometry and index-space constants.
//!
//! Reference: the original maksverver/pushfight solver's `perms.h`/`board.h`,
//! which this port's index space and field layout are bit-for-bit compatible
//! with.

/// Number of cells on the board (and length of a [`crate::perm::Perm`]).
pub const L: usize = 26;

/// Total number of valid `InProgress` permutations.
pub const TOTAL_PERMS: i64 = 401_567_166_000;

/// Total number of reachable canonical (rotation-minimized) positions.
pub const TOTAL_MINIMIZED: i64 = 86_208_131_520;

/// Multiset frequency of each symbol in any valid permutation, indexed by
/// [`crate::piece::Piece::index`].
pub const ALL_FREQ: [i64; 6] = [16, 2, 3, 2, 2, 1];

/// Board height in rows.
pub const BOARD_H: usize = 4;

/// Board width in columns.
pub const BOARD_W: usize = 8;

/// `BOARD_INDEX[r][c]` is the field index at row `r`, column `c`, or `-1` if
/// the cell is a removed corner / off the board.
pub const BOARD_INDEX: [[i8; BOARD_W]; BOARD_H] = [
    [-1, -1, 0, 1, 2, 3, 4, -1],
    [5, 6, 7, 8, 9, 10, 11, 12],
    [13, 14, 15, 16, 17, 18, 19, 20],
    [-1, 21, 22, 23, 24, 25, -1, -1],
];

/// Row of each field index.
pub const FIELD_ROW: [u8; L] = [
    0, 0, 0, 0, 0, //
    1, 1, 1, 1, 1, 1, 1, 1, //
    2, 2, 2, 2, 2, 2, 2, 2, //
    3, 3, 3, 3, 3,
];

/// Column of each field index.
pub const FIELD_COL: [u8; L] = [
    2, 3, 4, 5, 6, //
    0, 1, 2, 3, 4, 5, 6, 7, //
    0, 1, 2, 3, 4, 5, 6, 7, //
    1, 2, 3, 4, 5,
];

/// Field indices on the board's edge from which a push can eject a piece.
pub const DANGER_POSITIONS: [u8; 10] = [0, 4, 5, 6, 12, 13, 19, 20, 21, 25];

/// The four push/move directions: up, left, right, down.
pub const DR: [i8; 4] = [-1, 0, 0, 1];
pub const DC: [i8; 4] = [0, -1, 1, 0];

/// Number of positions in a chunk (1/[`NUM_CHUNKS`] of the index space).
pub const CHUNK_SIZE: i64 = 54_054_000;

/// Number of chunks covering the full index range.
pub const NUM_CHUNKS: i64 = 7429;

/// Number of parts a chunk is split into for thread dispatch.
pub const NUM_PARTS: i64 = 225;

/// Number of positions in a part.
pub const PART_SIZE: i64 = 240_240;

const _: () = assert!(CHUNK_SIZE * NUM_CHUNKS == TOTAL_PERMS);
const _: () = assert!(PART_SIZE * NUM_PARTS == CHUNK_SIZE);
const _: () = assert!(PART_SIZE % 16 == 0);
const _: () = assert!(CHUNK_SIZE % 5 == 0);

/// Returns the field index at `(row, col)`, or `None` if off-board.
#[inline]
pub const fn board_index(row: i32, col: i32) -> Option<u8> {
    if row < 0 || row >= BOARD_H as i32 || col < 0 || col >= BOARD_W as i32 {
        return None;
    }
    let i = BOARD_INDEX[row as usize][col as usize];
    if i < 0 { None } else { Some(i as u8) }
}

/// Returns the field index reached from `field` by stepping one cell in
/// direction `d` (0=up, 1=left, 2=right, 3=down), or `None` if off-board.
#[inline]
pub const fn neighbor(field: u8, d: usize) -> Option<u8> {
    let row = FIELD_ROW[field as usize] as i32 + DR[d] as i32;
    let col = FIELD_COL[field as usize] as i32 + DC[d] as i32;
    board_index(row, col)
}

/// Formats a field index as algebraic board notation (column letter, then row
/// digit counting down from the top), matching the original tool's
/// `FieldToId`.
pub fn field_to_id(field: u8) -> String {
    let col = (b'a' + FIELD_COL[field as usize]) as char;
    let row = (b'4' - FIELD_ROW[field as usize]) as char;
    format!("{col}{row}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_partition_exact() {
        assert_eq!(CHUNK_SIZE * NUM_CHUNKS, TOTAL_PERMS);
        assert_eq!(PART_SIZE * NUM_PARTS, CHUNK_SIZE);
        assert_eq!(PART_SIZE % 16, 0);
    }

    #[test]
    fn neighbor_table_stays_on_board() {
        for field in 0..L as u8 {
            for d in 0..4 {
                if let Some(n) = neighbor(field, d) {
                    assert!(n < L as u8);
                }
            }
        }
    }

    #[test]
    fn field_to_id_matches_known_cells() {
        // Field 0 is row 0, col 2 -> "c4"
        assert_eq!(field_to_id(0), "c4");
        // Field 25 is row 3, col 5 -> "f1"
        assert_eq!(field_to_id(25), "f1");
    }
}
