//! The move sequence that led from a position to one of its successors.

use arrayvec::ArrayVec;

/// Maximum number of (from, to) steps in a single turn: up to two moves plus
/// a final push.
pub const MAX_STEPS: usize = 3;

/// A (from, to) step: either a move of a piece to an empty field, or the
/// final push of an adjacent occupied field.
pub type Step = (u8, u8);

/// The sequence of steps that produced a successor, in play order. The last
/// step is always the push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Moves(pub ArrayVec<Step, MAX_STEPS>);

impl Moves {
    /// An empty move sequence.
    #[inline]
    pub fn new() -> Moves {
        Moves(ArrayVec::new())
    }

    /// The field a piece last moved to, if any step has been taken.
    #[inline]
    pub fn last_destination(&self) -> Option<u8> {
        self.0.last().map(|&(_, to)| to)
    }

    #[inline]
    pub fn push(&mut self, step: Step) {
        self.0.push(step);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Step> {
        self.0.pop()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Step] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_destination_tracks_most_recent_step() {
        let mut m = Moves::new();
        assert_eq!(m.last_destination(), None);
        m.push((3, 7));
        assert_eq!(m.last_destination(), Some(7));
        m.push((7, 12));
        assert_eq!(m.last_destination(), Some(12));
        m.pop();
        assert_eq!(m.last_destination(), Some(7));
    }
}
