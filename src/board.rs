//! The 49-bit board representation: bit-parallel move generation,
//! constant-time move application, and dead-end detection.
//!
//! A board is a pair of 49-bit masks, `pegs` and `valid`, over cells indexed
//! `pos = row*7 + col`. `valid` never changes across a move; only `pegs`
//! does. See [`crate::symmetry`] for the D4 canonicalisation of English-cross
//! boards and [`crate::zobrist`] for the incrementally-hashed variant used by
//! the hot search loops.

use crate::error::BoardError;
use serde::{Deserialize, Serialize};

/// Linear positions of the 33-cell English cross, `pos = row*7 + col`.
pub const ENGLISH_VALID_POSITIONS: [u8; 33] = [
    2, 3, 4, 9, 10, 11, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32,
    33, 34, 37, 38, 39, 44, 45, 46,
];

/// The centre cell of the English cross (row 3, col 3).
pub const CENTER: u8 = 24;

const fn build_mask(positions: &[u8]) -> u64 {
    let mut mask = 0u64;
    let mut i = 0;
    while i < positions.len() {
        mask |= 1u64 << positions[i];
        i += 1;
    }
    mask
}

const fn col_at_most(max_col: u8) -> u64 {
    let mut mask = 0u64;
    let mut pos = 0u8;
    while pos < 49 {
        if pos % 7 <= max_col {
            mask |= 1u64 << pos;
        }
        pos += 1;
    }
    mask
}

const fn col_at_least(min_col: u8) -> u64 {
    let mut mask = 0u64;
    let mut pos = 0u8;
    while pos < 49 {
        if pos % 7 >= min_col {
            mask |= 1u64 << pos;
        }
        pos += 1;
    }
    mask
}

const fn row_at_most(max_row: u8) -> u64 {
    let mut mask = 0u64;
    let mut pos = 0u8;
    while pos < 49 {
        if pos / 7 <= max_row {
            mask |= 1u64 << pos;
        }
        pos += 1;
    }
    mask
}

const fn row_at_least(min_row: u8) -> u64 {
    let mut mask = 0u64;
    let mut pos = 0u8;
    while pos < 49 {
        if pos / 7 >= min_row {
            mask |= 1u64 << pos;
        }
        pos += 1;
    }
    mask
}

/// Mask of the 33 cells that make up the standard English cross.
pub const ENGLISH_VALID_MASK: u64 = build_mask(&ENGLISH_VALID_POSITIONS);
/// English cross with every cell but the centre filled.
pub const ENGLISH_START: u64 = ENGLISH_VALID_MASK & !(1u64 << CENTER);
/// A single peg at the centre cell.
pub const ENGLISH_GOAL: u64 = 1u64 << CENTER;
/// All 49 cells of a full, uncut 7x7 board.
pub const FULL_MASK: u64 = (1u64 << 49) - 1;

// Column guards exclude the wraparound a naive `<<1`/`>>1` shift would
// otherwise produce between e.g. column 6 of one row and column 0 of the next.
const COL_LE4: u64 = col_at_most(4);
const COL_GE2: u64 = col_at_least(2);
const ROW_LE4: u64 = row_at_most(4);
const ROW_GE2: u64 = row_at_least(2);

/// A single jump move: peg at `from` jumps over `over` and lands on `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub from: u8,
    pub over: u8,
    pub to: u8,
}

impl Move {
    pub const fn new(from: u8, over: u8, to: u8) -> Self {
        Self { from, over, to }
    }

    /// The move that undoes this one (lands back where it started).
    pub const fn reversed(self) -> Self {
        Self {
            from: self.to,
            over: self.over,
            to: self.from,
        }
    }
}

/// A 7x7 cell-masked board: `pegs` is the set of occupied cells, `valid` is
/// the set of cells that exist at all (the rest are "cut out").
///
/// Invariants upheld by every public constructor and every [`Board::apply_move`]
/// call: `pegs ⊆ valid`, and `valid` never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    pub pegs: u64,
    pub valid: u64,
}

impl Board {
    /// Build a board, checking `pegs ⊆ valid` and that both masks fit in 49 bits.
    pub fn new(pegs: u64, valid: u64) -> Result<Self, BoardError> {
        if pegs & !FULL_MASK != 0 || valid & !FULL_MASK != 0 {
            return Err(BoardError::CellOutOfRange(64));
        }
        if pegs & !valid != 0 {
            let bad = (pegs & !valid).trailing_zeros();
            return Err(BoardError::PegOutsideValid(bad as u8));
        }
        Ok(Self { pegs, valid })
    }

    /// Build a board without checking invariants. Only safe when the caller
    /// derived `pegs`/`valid` from an already-valid board (e.g. `apply_move`).
    pub(crate) fn new_unchecked(pegs: u64, valid: u64) -> Self {
        Self { pegs, valid }
    }

    /// The standard 33-cell English cross with the centre empty.
    pub fn english_start() -> Self {
        Self::new_unchecked(ENGLISH_START, ENGLISH_VALID_MASK)
    }

    /// The standard English terminal state: one peg at the centre.
    pub fn english_goal() -> Self {
        Self::new_unchecked(ENGLISH_GOAL, ENGLISH_VALID_MASK)
    }

    /// Whether `valid` is exactly the standard English-cross mask. Symmetry
    /// canonicalisation, the Pagoda heuristic, and the Pattern Database are
    /// only meaningful for boards where this holds.
    #[inline]
    pub fn is_english(&self) -> bool {
        self.valid == ENGLISH_VALID_MASK
    }

    #[inline]
    pub fn holes(&self) -> u64 {
        self.valid & !self.pegs
    }

    #[inline]
    pub fn peg_count(&self) -> u32 {
        self.pegs.count_ones()
    }

    #[inline]
    pub fn has_peg(&self, pos: u8) -> bool {
        self.pegs & (1u64 << pos) != 0
    }

    #[inline]
    pub fn is_solved(&self) -> bool {
        self.peg_count() == 1
    }

    /// Solved at the specific target cell.
    #[inline]
    pub fn is_solved_at(&self, target: u8) -> bool {
        self.pegs == (1u64 << target)
    }

    /// The four per-direction "can jump this way" bitmasks, one bit per
    /// origin cell. Shared by `generate_moves` and `is_dead` so dead-end
    /// checks don't pay for building the move list.
    #[inline]
    fn direction_masks(&self) -> [u64; 4] {
        let pegs = self.pegs;
        let holes = self.holes();
        let right = pegs & (pegs >> 1) & (holes >> 2) & COL_LE4;
        let left = pegs & (pegs << 1) & (holes << 2) & COL_GE2;
        let down = pegs & (pegs >> 7) & (holes >> 14) & ROW_LE4;
        let up = pegs & (pegs << 7) & (holes << 14) & ROW_GE2;
        [right, left, down, up]
    }

    /// Every legal jump move from this position, bit-parallel generation
    /// with one bit-scan per set bit of each direction mask.
    pub fn generate_moves(&self) -> Vec<Move> {
        let [right, left, down, up] = self.direction_masks();
        let mut moves = Vec::with_capacity(
            (right.count_ones() + left.count_ones() + down.count_ones() + up.count_ones())
                as usize,
        );
        let mut bits = right;
        while bits != 0 {
            let from = bits.trailing_zeros() as u8;
            moves.push(Move::new(from, from + 1, from + 2));
            bits &= bits - 1;
        }
        let mut bits = left;
        while bits != 0 {
            let from = bits.trailing_zeros() as u8;
            moves.push(Move::new(from, from - 1, from - 2));
            bits &= bits - 1;
        }
        let mut bits = down;
        while bits != 0 {
            let from = bits.trailing_zeros() as u8;
            moves.push(Move::new(from, from + 7, from + 14));
            bits &= bits - 1;
        }
        let mut bits = up;
        while bits != 0 {
            let from = bits.trailing_zeros() as u8;
            moves.push(Move::new(from, from - 7, from - 14));
            bits &= bits - 1;
        }
        moves
    }

    /// Whether any legal move exists, without allocating a move list.
    #[inline]
    pub fn has_any_move(&self) -> bool {
        self.direction_masks().iter().any(|m| *m != 0)
    }

    /// True iff no move is available and more than one peg remains. A board
    /// with 0 or 1 pegs is not "dead" — it is solved (or empty).
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.peg_count() > 1 && !self.has_any_move()
    }

    /// Apply a move, producing the resulting board. Three XORs, no branches;
    /// callers are expected to only pass moves from `generate_moves` (or
    /// otherwise pre-validated ones — see [`crate::verify`] for the checked path).
    #[inline]
    pub fn apply_move(&self, mv: Move) -> Self {
        let new_pegs =
            self.pegs ^ (1u64 << mv.from) ^ (1u64 << mv.over) ^ (1u64 << mv.to);
        Self::new_unchecked(new_pegs, self.valid)
    }
}

#[inline]
pub fn pos_to_coords(pos: u8) -> (u8, u8) {
    (pos / 7, pos % 7)
}

#[inline]
pub fn coords_to_pos(row: u8, col: u8) -> u8 {
    row * 7 + col
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_start_has_32_pegs() {
        let b = Board::english_start();
        assert_eq!(b.peg_count(), 32);
        assert!(b.is_english());
        assert!(!b.has_peg(CENTER));
    }

    #[test]
    fn new_rejects_peg_outside_valid() {
        let err = Board::new(1u64 << 0, ENGLISH_VALID_MASK).unwrap_err();
        assert!(matches!(err, BoardError::PegOutsideValid(0)));
    }

    #[test]
    fn apply_move_preserves_valid_and_peg_count() {
        let b = Board::english_start();
        let mv = b
            .generate_moves()
            .into_iter()
            .next()
            .expect("start position has moves");
        let after = b.apply_move(mv);
        assert_eq!(after.valid, b.valid);
        assert_eq!(after.peg_count(), b.peg_count() - 1);
    }

    #[test]
    fn minimal_scenario_two_pegs_one_hole() {
        // S1: pegs at 16,17 and a hole at 18 on the English cross.
        let pegs = (1u64 << 16) | (1u64 << 17);
        let b = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let moves = b.generate_moves();
        assert_eq!(moves, vec![Move::new(16, 17, 18)]);
        let after = b.apply_move(moves[0]);
        assert!(after.is_solved());
        assert!(after.is_solved_at(18));
    }

    #[test]
    fn dead_end_has_no_moves_but_is_not_solved() {
        // Two isolated pegs with no shared neighbourhood: corners of a 5-cell plus.
        let valid = (1u64 << 10) | (1u64 << 16) | (1u64 << 24) | (1u64 << 32) | (1u64 << 38);
        let pegs = (1u64 << 10) | (1u64 << 38);
        let b = Board::new(pegs, valid).unwrap();
        assert!(b.generate_moves().is_empty());
        assert!(b.is_dead());
        assert!(!b.is_solved());
    }

    #[test]
    fn arbitrary_plus_board_solves_in_two_moves() {
        // S4: a 5-cell plus with the centre empty, two opposite arms filled so
        // a single jump removes one and a second jump finishes it.
        let center = coords_to_pos(3, 3);
        let up = coords_to_pos(2, 3);
        let down = coords_to_pos(4, 3);
        let left = coords_to_pos(3, 2);
        let right = coords_to_pos(3, 4);
        let valid = (1u64 << center) | (1u64 << up) | (1u64 << down) | (1u64 << left) | (1u64 << right);
        let pegs = valid & !(1u64 << center);
        let b = Board::new(pegs, valid).unwrap();
        assert!(!b.is_english());
        let moves = b.generate_moves();
        assert!(!moves.is_empty());
        let after = b.apply_move(moves[0]);
        let moves2 = after.generate_moves();
        assert!(!moves2.is_empty() || after.is_solved());
    }

    #[test]
    fn is_dead_matches_empty_move_generation() {
        let b = Board::english_start();
        for mv in b.generate_moves() {
            let after = b.apply_move(mv);
            assert_eq!(after.is_dead(), after.generate_moves().is_empty() && after.peg_count() > 1);
        }
    }
}
