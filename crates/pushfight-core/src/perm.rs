//! The permutation codec: ranking/unranking positions, rotation, and
//! position-type validation.
//!
//! Reference: the original maksverver/pushfight solver's `perms.cc`. The
//! rank/unrank algorithm here is a direct port: precompute a table of
//! multiset-permutation counts over all sub-multisets of the master
//! multiset, then walk the permutation accumulating how many permutations
//! would sort before it.

use std::sync::OnceLock;

use crate::constants::{ALL_FREQ, L, TOTAL_PERMS};
use crate::piece::Piece;

pub mod minimized;

/// Frequency dimensions, one more than each symbol's max count in
/// [`ALL_FREQ`] (so indices `0..=freq` are representable).
const DIMS: [usize; 6] = [17, 3, 4, 3, 3, 2];

const fn dims_len() -> usize {
    DIMS[0] * DIMS[1] * DIMS[2] * DIMS[3] * DIMS[4] * DIMS[5]
}

#[inline(always)]
const fn sub_multiset_index(freq: &[usize; 6]) -> usize {
    (((((freq[0] * DIMS[1] + freq[1]) * DIMS[2] + freq[2]) * DIMS[3] + freq[3]) * DIMS[4]
        + freq[4])
        * DIMS[5]
        + freq[5])
}

struct Tables {
    /// `num_perms[sub_multiset_index(freq)]` = number of distinct
    /// permutations of a string with that symbol frequency vector.
    num_perms: Vec<i64>,
    /// `index_of_memo[x * dims_len() + sub_multiset_index(freq)]` = number of
    /// permutations of the multiset `freq` whose first symbol is strictly
    /// smaller than `x`.
    index_of_memo: Vec<i64>,
}

impl Tables {
    fn build() -> Tables {
        let len = dims_len();
        let mut num_perms = vec![0i64; len];
        let mut fac = [1i64; 4];
        for i in 1..4 {
            fac[i] = fac[i - 1] * i as i64;
        }
        for a in 0..DIMS[0] {
            for b in 0..DIMS[1] {
                for c in 0..DIMS[2] {
                    for d in 0..DIMS[3] {
                        for e in 0..DIMS[4] {
                            for f in 0..DIMS[5] {
                                let sum = a + b + c + d + e + f;
                                let mut n: i64 = 1;
                                for i in (a + 1)..=sum {
                                    n *= i as i64;
                                }
                                let m = fac[b] * fac[c] * fac[d] * fac[e] * fac[f];
                                debug_assert_eq!(n % m, 0);
                                let freq = [a, b, c, d, e, f];
                                num_perms[sub_multiset_index(&freq)] = n / m;
                            }
                        }
                    }
                }
            }
        }
        debug_assert_eq!(num_perms[sub_multiset_index(&[0, 0, 0, 0, 0, 0])], 1);
        debug_assert_eq!(
            num_perms[sub_multiset_index(&[16, 2, 3, 2, 2, 1])],
            TOTAL_PERMS
        );

        let mut index_of_memo = vec![0i64; 6 * len];
        for a in 0..DIMS[0] {
            for b in 0..DIMS[1] {
                for c in 0..DIMS[2] {
                    for d in 0..DIMS[3] {
                        for e in 0..DIMS[4] {
                            for f in 0..DIMS[5] {
                                let mut freq = [a, b, c, d, e, f];
                                for x in 0..6 {
                                    let mut n = 0i64;
                                    for y in 0..x {
                                        if freq[y] > 0 {
                                            freq[y] -= 1;
                                            n += num_perms[sub_multiset_index(&freq)];
                                            freq[y] += 1;
                                        }
                                    }
                                    index_of_memo[x * len + sub_multiset_index(&freq)] = n;
                                }
                            }
                        }
                    }
                }
            }
        }

        Tables {
            num_perms,
            index_of_memo,
        }
    }

    #[inline]
    fn num_perms(&self, freq: &[usize; 6]) -> i64 {
        self.num_perms[sub_multiset_index(freq)]
    }

    #[inline]
    fn smaller_leading_count(&self, x: usize, freq: &[usize; 6]) -> i64 {
        self.index_of_memo[x * dims_len() + sub_multiset_index(freq)]
    }
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Builds the rank/unrank lookup tables if they have not been built yet.
///
/// Calling this explicitly is optional — [`Perm::rank`] and [`Perm::unrank`]
/// initialize on first use — but phase drivers call it once up front so the
/// (bounded, single-shot) table-build cost doesn't land inside the first
/// worker's timing.
pub fn initialize() {
    TABLES.get_or_init(Tables::build);
}

fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::build)
}

/// The kind of position a 26-symbol multiset permutation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionType {
    /// The array is not a permutation of the master multiset at all.
    Invalid,
    /// No anchor has been placed yet — no move has been made.
    Started,
    /// Exactly one anchor is placed; this is the only type with an index.
    InProgress,
    /// A piece has been pushed off the board.
    Finished,
}

/// A board position: an ordered sequence of 26 pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Perm([u8; L]);

impl Perm {
    /// The lexicographically first `InProgress` permutation.
    pub const FIRST: Perm = Perm([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 2, 2, 2, 3, 3, 4, 4, 5,
    ]);

    /// The lexicographically last `InProgress` permutation.
    pub const LAST: Perm = Perm([
        5, 4, 4, 3, 3, 2, 2, 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    ]);

    /// Wraps a raw array of symbol values without validating it.
    #[inline]
    pub const fn from_raw(cells: [u8; L]) -> Perm {
        Perm(cells)
    }

    /// Returns the raw symbol array.
    #[inline(always)]
    pub const fn as_raw(&self) -> &[u8; L] {
        &self.0
    }

    /// Returns the piece at field `i`.
    #[inline(always)]
    pub fn get(&self, i: usize) -> Piece {
        Piece::from_u8(self.0[i])
    }

    /// Sets the piece at field `i`.
    #[inline(always)]
    pub fn set(&mut self, i: usize, piece: Piece) {
        self.0[i] = piece as u8;
    }

    /// Classifies this permutation's [`PositionType`].
    pub fn classify(&self) -> PositionType {
        let mut freq = [0u32; 6];
        for &v in &self.0 {
            if v as usize >= 6 {
                return PositionType::Invalid;
            }
            freq[v as usize] += 1;
        }
        let all_freq: [u32; 6] = std::array::from_fn(|i| ALL_FREQ[i] as u32);
        if freq == all_freq {
            return PositionType::InProgress;
        }
        // Started: the anchor slot holds an unanchored black pusher instead.
        let mut started = all_freq;
        started[Piece::BlackAnchor.index()] -= 1;
        started[Piece::BlackPusher.index()] += 1;
        if freq == started {
            return PositionType::Started;
        }
        // Finished: one piece (not the anchor) has been pushed off, leaving
        // one extra Empty cell.
        if freq[Piece::Empty.index()] == all_freq[Piece::Empty.index()] + 1
            && freq[Piece::BlackAnchor.index()] == all_freq[Piece::BlackAnchor.index()]
        {
            let mut missing = 0;
            let mut ok = true;
            for i in [
                Piece::WhiteMover.index(),
                Piece::WhitePusher.index(),
                Piece::BlackMover.index(),
                Piece::BlackPusher.index(),
            ] {
                if freq[i] == all_freq[i] {
                    continue;
                } else if freq[i] + 1 == all_freq[i] {
                    missing += 1;
                } else {
                    ok = false;
                    break;
                }
            }
            if ok && missing == 1 {
                return PositionType::Finished;
            }
        }
        PositionType::Invalid
    }

    /// Computes the rank (index) of this permutation within `[0,
    /// TOTAL_PERMS)`.
    ///
    /// # Panics
    ///
    /// Panics (in debug builds) if this is not an `InProgress` permutation.
    pub fn rank(&self) -> i64 {
        debug_assert_eq!(self.classify(), PositionType::InProgress);
        let t = tables();
        let mut freq = [0usize; 6];
        let mut idx: i64 = 0;
        for i in (0..L).rev() {
            let x = self.0[i] as usize;
            freq[x] += 1;
            idx += t.smaller_leading_count(x, &freq);
        }
        idx
    }

    /// Reconstructs the permutation at rank `idx` in `[0, TOTAL_PERMS)`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn unrank(idx: i64) -> Perm {
        assert!((0..TOTAL_PERMS).contains(&idx), "index out of range: {idx}");
        let t = tables();
        let mut freq: [usize; 6] = std::array::from_fn(|i| ALL_FREQ[i] as usize);
        let mut remaining = idx;
        let mut cells = [0u8; L];
        for cell in cells.iter_mut() {
            for x in 0..6 {
                if freq[x] == 0 {
                    continue;
                }
                freq[x] -= 1;
                let n = t.num_perms(&freq);
                if n > remaining {
                    *cell = x as u8;
                    break;
                }
                freq[x] += 1;
                remaining -= n;
            }
        }
        debug_assert_eq!(remaining, 0);
        Perm(cells)
    }

    /// Advances this permutation to the lexicographically next one in-place,
    /// using the standard "next permutation" algorithm over the raw symbol
    /// array. Returns `false` if this was already the last permutation of its
    /// multiset (the array is left unchanged in the lexicographic sense the
    /// algorithm defines: reversed to the first permutation of the suffix).
    ///
    /// For any `i` with `i + 1 < TOTAL_PERMS`, calling this on
    /// `Perm::unrank(i)` yields `Perm::unrank(i + 1)`.
    pub fn advance(&mut self) -> bool {
        let a = &mut self.0;
        if a.len() < 2 {
            return false;
        }
        let mut i = a.len() - 1;
        while i > 0 && a[i - 1] >= a[i] {
            i -= 1;
        }
        if i == 0 {
            a.reverse();
            return false;
        }
        let pivot = i - 1;
        let mut j = a.len() - 1;
        while a[j] <= a[pivot] {
            j -= 1;
        }
        a.swap(pivot, j);
        a[i..].reverse();
        true
    }

    /// Reverses the cell order, rotating the board 180 degrees. A position
    /// and its rotation have identical game value.
    #[inline]
    pub fn rotate(&self) -> Perm {
        let mut cells = self.0;
        cells.reverse();
        Perm(cells)
    }

    /// Returns the lexicographically smaller of this permutation and its
    /// rotation — the canonical form used by the minimized index.
    #[inline]
    pub fn canonical(&self) -> Perm {
        let rotated = self.rotate();
        if rotated.0 < self.0 { rotated } else { *self }
    }

    /// Returns `true` if this permutation is its own canonical form.
    #[inline]
    pub fn is_canonical(&self) -> bool {
        self.0 <= self.rotate().0
    }

    /// Renders the position as a 4-row ASCII board, one cell per character.
    pub fn board_art(&self) -> String {
        use crate::constants::BOARD_INDEX;
        let mut out = String::new();
        for row in BOARD_INDEX {
            for cell in row {
                if cell < 0 {
                    out.push(' ');
                } else {
                    out.push(self.get(cell as usize).to_char());
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn first_and_last_perm_boundaries() {
        assert_eq!(Perm::FIRST.rank(), 0);
        assert_eq!(Perm::unrank(0), Perm::FIRST);
        assert_eq!(Perm::LAST.rank(), TOTAL_PERMS - 1);
        assert_eq!(Perm::unrank(TOTAL_PERMS - 1), Perm::LAST);
    }

    #[test]
    fn rank_unrank_round_trip_sampled() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2000 {
            let idx = rng.random_range(0..TOTAL_PERMS);
            assert_eq!(Perm::unrank(idx).rank(), idx);
        }
    }

    #[test]
    fn advance_matches_rank_plus_one() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let idx = rng.random_range(0..TOTAL_PERMS - 2000);
            let mut p = Perm::unrank(idx);
            for step in 1..1000i64 {
                p.advance();
                assert_eq!(p.rank(), idx + step);
            }
        }
    }

    #[test]
    fn rotation_is_involution() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            let idx = rng.random_range(0..TOTAL_PERMS);
            let p = Perm::unrank(idx);
            assert_eq!(p.rotate().rotate(), p);
        }
    }

    #[test]
    fn classify_recognizes_in_progress() {
        assert_eq!(Perm::FIRST.classify(), PositionType::InProgress);
        assert_eq!(Perm::LAST.classify(), PositionType::InProgress);
    }

    #[test]
    fn classify_rejects_garbage() {
        let garbage = Perm::from_raw([0u8; L]);
        assert_eq!(garbage.classify(), PositionType::Invalid);
    }
}
