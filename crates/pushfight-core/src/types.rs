//! Outcome and Value types shared across the phase drivers and storage
//! accessors.

use std::fmt;

/// Phase number. Phase 0 marks immediate wins, phase 1 immediate losses, and
/// phase N (N >= 2) extends the frontier by one more ply.
pub type Phase = u32;

/// A position's game-theoretic outcome relative to the player to move, as
/// tracked while a phase is in progress. Packs five per byte in `RN` files
/// (see [`crate::storage::rn`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Outcome {
    #[default]
    Tie = 0,
    Loss = 1,
    Win = 2,
}

impl Outcome {
    /// Decodes a ternary digit (0, 1, or 2) into an `Outcome`.
    #[inline]
    pub fn from_digit(d: u8) -> Option<Outcome> {
        match d {
            0 => Some(Outcome::Tie),
            1 => Some(Outcome::Loss),
            2 => Some(Outcome::Win),
            _ => None,
        }
    }

    /// Returns the raw digit value (0, 1, or 2).
    #[inline(always)]
    pub const fn digit(self) -> u8 {
        self as u8
    }

    /// The outcome from the opponent's perspective of the same position.
    #[inline]
    pub const fn inverse(self) -> Outcome {
        match self {
            Outcome::Tie => Outcome::Tie,
            Outcome::Loss => Outcome::Win,
            Outcome::Win => Outcome::Loss,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Tie => "tie",
            Outcome::Loss => "loss",
            Outcome::Win => "win",
        })
    }
}

/// Post-phase encoding of a position's final outcome: `0` = Tie, odd `2k+1` =
/// Loss-in-`k` plies, even `2k` = Win-in-`k` plies (`k >= 1`). Stored one per
/// reachable canonical position in `minimized.bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Value(pub u8);

impl Value {
    /// The tie value.
    pub const TIE: Value = Value(0);

    /// Builds a `Win`-in-`plies` value.
    #[inline]
    pub fn win(plies: u32) -> Value {
        debug_assert!(plies >= 1);
        Value((2 * plies) as u8)
    }

    /// Builds a `Loss`-in-`plies` value.
    #[inline]
    pub fn loss(plies: u32) -> Value {
        Value((2 * plies + 1) as u8)
    }

    /// Decomposes the value into its outcome and ply count.
    #[inline]
    pub fn decompose(self) -> (Outcome, u32) {
        if self.0 == 0 {
            (Outcome::Tie, 0)
        } else if self.0 % 2 == 0 {
            (Outcome::Win, self.0 as u32 / 2)
        } else {
            (Outcome::Loss, (self.0 as u32 - 1) / 2)
        }
    }

    /// Negates the value: flips win/loss and adds one ply, as happens when
    /// the value of a predecessor is derived from one of its successors.
    #[inline]
    pub fn negate(self) -> Value {
        if self.0 == 0 {
            Value::TIE
        } else {
            let (outcome, plies) = self.decompose();
            match outcome {
                Outcome::Win => Value::loss(plies + 1),
                Outcome::Loss => Value::win(plies + 1),
                Outcome::Tie => unreachable!(),
            }
        }
    }

    /// Returns a sort key such that `a.rank_key() < b.rank_key()` iff `a` is
    /// at least as good as `b` from the mover's perspective: winning (smallest
    /// magnitude first), then tying, then losing (largest magnitude first).
    pub fn rank_key(self) -> (u8, i32) {
        match self.decompose() {
            (Outcome::Win, k) => (0, k as i32),
            (Outcome::Tie, _) => (1, 0),
            (Outcome::Loss, k) => (2, -(k as i32)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decompose() {
            (Outcome::Tie, _) => write!(f, "tie"),
            (Outcome::Win, k) => write!(f, "win-in-{k}"),
            (Outcome::Loss, k) => write!(f, "loss-in-{k}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negate_flips_and_increments() {
        assert_eq!(Value::win(3).negate(), Value::loss(4));
        assert_eq!(Value::loss(2).negate(), Value::win(3));
        assert_eq!(Value::TIE.negate(), Value::TIE);
    }

    #[test]
    fn decompose_round_trips() {
        for k in 1..30u32 {
            assert_eq!(Value::win(k).decompose(), (Outcome::Win, k));
            assert_eq!(Value::loss(k).decompose(), (Outcome::Loss, k));
        }
        assert_eq!(Value::TIE.decompose(), (Outcome::Tie, 0));
    }

    #[test]
    fn ordering_prefers_quick_wins_then_ties_then_slow_losses() {
        let quick_win = Value::win(1);
        let slow_win = Value::win(10);
        let tie = Value::TIE;
        let slow_loss = Value::loss(2);
        let quick_loss = Value::loss(10);

        let mut values = [slow_loss, tie, quick_loss, slow_win, quick_win];
        values.sort_by_key(|v| v.rank_key());
        assert_eq!(values, [quick_win, slow_win, tie, quick_loss, slow_loss]);
    }

    #[test]
    fn outcome_inverse_is_involution() {
        for o in [Outcome::Tie, Outcome::Loss, Outcome::Win] {
            assert_eq!(o.inverse().inverse(), o);
        }
    }
}
