//! D4 symmetry canonicalisation for English-cross boards.
//!
//! The English cross has the full 4-fold dihedral symmetry of a square: four
//! rotations and four reflections. Canonicalising a board to the
//! lexicographically-smallest `pegs` value among its eight images collapses
//! symmetric duplicates in the solution store and in any visited-set used by
//! search. Each transform is precomputed as a `[u8; 49]` permutation of cell
//! indices so canonicalisation is eight table-driven bit-permutes, not eight
//! coordinate recomputations per lookup.

use crate::board::{coords_to_pos, pos_to_coords};

/// The eight elements of the dihedral group of the square, in a fixed order.
/// Index 0 is always the identity.
pub const NUM_SYMMETRIES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    Identity,
    Rot90,
    Rot180,
    Rot270,
    FlipH,
    FlipV,
    FlipDiag,
    FlipAntiDiag,
}

const ALL: [Symmetry; NUM_SYMMETRIES] = [
    Symmetry::Identity,
    Symmetry::Rot90,
    Symmetry::Rot180,
    Symmetry::Rot270,
    Symmetry::FlipH,
    Symmetry::FlipV,
    Symmetry::FlipDiag,
    Symmetry::FlipAntiDiag,
];

impl Symmetry {
    pub const fn index(self) -> usize {
        match self {
            Symmetry::Identity => 0,
            Symmetry::Rot90 => 1,
            Symmetry::Rot180 => 2,
            Symmetry::Rot270 => 3,
            Symmetry::FlipH => 4,
            Symmetry::FlipV => 5,
            Symmetry::FlipDiag => 6,
            Symmetry::FlipAntiDiag => 7,
        }
    }

    pub const fn from_index(i: usize) -> Self {
        ALL[i]
    }

    /// This transform's inverse. Rotations invert to their complementary
    /// rotation; every reflection is its own inverse.
    pub const fn inverse(self) -> Self {
        match self {
            Symmetry::Identity => Symmetry::Identity,
            Symmetry::Rot90 => Symmetry::Rot270,
            Symmetry::Rot180 => Symmetry::Rot180,
            Symmetry::Rot270 => Symmetry::Rot90,
            Symmetry::FlipH => Symmetry::FlipH,
            Symmetry::FlipV => Symmetry::FlipV,
            Symmetry::FlipDiag => Symmetry::FlipDiag,
            Symmetry::FlipAntiDiag => Symmetry::FlipAntiDiag,
        }
    }

    /// Where `(row, col)` maps to under this transform, on a 7x7 grid.
    fn map_coords(self, row: u8, col: u8) -> (u8, u8) {
        const N: u8 = 6; // last valid index on a 7-wide board
        match self {
            Symmetry::Identity => (row, col),
            Symmetry::Rot90 => (col, N - row),
            Symmetry::Rot180 => (N - row, N - col),
            Symmetry::Rot270 => (N - col, row),
            Symmetry::FlipH => (row, N - col),
            Symmetry::FlipV => (N - row, col),
            Symmetry::FlipDiag => (col, row),
            Symmetry::FlipAntiDiag => (N - col, N - row),
        }
    }
}

/// `perm[s][pos]` is the cell that `pos` maps to under symmetry `s`.
struct PermTables([[u8; 49]; NUM_SYMMETRIES]);

fn build_perm_tables() -> PermTables {
    let mut tables = [[0u8; 49]; NUM_SYMMETRIES];
    for sym in ALL {
        let table = &mut tables[sym.index()];
        for pos in 0..49u8 {
            let (row, col) = pos_to_coords(pos);
            let (new_row, new_col) = sym.map_coords(row, col);
            table[pos as usize] = coords_to_pos(new_row, new_col);
        }
    }
    PermTables(tables)
}

thread_local! {
    static PERM_TABLES: PermTables = build_perm_tables();
}

/// Apply symmetry `sym` to a 49-bit cell mask.
pub fn permute_mask(sym: Symmetry, mask: u64) -> u64 {
    PERM_TABLES.with(|t| {
        let table = &t.0[sym.index()];
        let mut out = 0u64;
        let mut bits = mask;
        while bits != 0 {
            let pos = bits.trailing_zeros() as u8;
            out |= 1u64 << table[pos as usize];
            bits &= bits - 1;
        }
        out
    })
}

/// Apply symmetry `sym` to a single cell index.
pub fn permute_cell(sym: Symmetry, pos: u8) -> u8 {
    PERM_TABLES.with(|t| t.0[sym.index()][pos as usize])
}

/// Apply symmetry `sym` to a move, permuting all three of its cells.
pub fn permute_move(sym: Symmetry, mv: crate::board::Move) -> crate::board::Move {
    crate::board::Move::new(
        permute_cell(sym, mv.from),
        permute_cell(sym, mv.over),
        permute_cell(sym, mv.to),
    )
}

/// The canonical form of a peg mask: the lexicographically-smallest image
/// among the eight D4 transforms, plus the symmetry that produced it.
///
/// Only meaningful when the board's `valid` mask is the English cross — the
/// cross is the only board shape in scope that has the full square symmetry.
pub fn canonical(pegs: u64) -> (u64, Symmetry) {
    let mut best = pegs;
    let mut best_sym = Symmetry::Identity;
    for sym in ALL {
        let image = permute_mask(sym, pegs);
        if image < best {
            best = image;
            best_sym = sym;
        }
    }
    (best, best_sym)
}

/// The memoisation/lookup key for a board (spec §3 "State key"): the
/// minimal D4 image for an English-cross board, or `pegs` itself for an
/// arbitrary cut-out whose symmetries are not assumed.
pub fn canonical_key(board: &crate::board::Board) -> u64 {
    if board.is_english() {
        canonical(board.pegs).0
    } else {
        board.pegs
    }
}

/// The board-aware counterpart of [`canonical`]: the minimal D4 image and
/// the symmetry that produced it for an English-cross board, or `pegs`
/// unchanged under the identity symmetry for an arbitrary cut-out.
///
/// The solution store needs both the key *and* the symmetry, so it can
/// rewrite stored moves back into a query board's own coordinate frame
/// (§4.H's "symmetry-transformed lookup"). Calling the bare [`canonical`]
/// on an arbitrary board's `pegs` would produce a minimal image and a
/// symmetry that have no geometric meaning for that board's `valid` mask —
/// only the English cross has the full square symmetry the permutation
/// tables assume.
pub fn canonical_with_symmetry(board: &crate::board::Board) -> (u64, Symmetry) {
    if board.is_english() {
        canonical(board.pegs)
    } else {
        (board.pegs, Symmetry::Identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, ENGLISH_VALID_MASK};

    #[test]
    fn identity_is_a_noop() {
        let b = Board::english_start();
        assert_eq!(permute_mask(Symmetry::Identity, b.pegs), b.pegs);
    }

    #[test]
    fn valid_mask_is_symmetry_invariant() {
        for sym in ALL {
            assert_eq!(permute_mask(sym, ENGLISH_VALID_MASK), ENGLISH_VALID_MASK);
        }
    }

    #[test]
    fn rot90_four_times_is_identity() {
        let b = Board::english_start();
        let mut m = b.pegs;
        for _ in 0..4 {
            m = permute_mask(Symmetry::Rot90, m);
        }
        assert_eq!(m, b.pegs);
    }

    #[test]
    fn inverse_undoes_transform() {
        let b = Board::english_start();
        for sym in ALL {
            let forward = permute_mask(sym, b.pegs);
            let back = permute_mask(sym.inverse(), forward);
            assert_eq!(back, b.pegs);
        }
    }

    #[test]
    fn english_start_is_its_own_canonical_form() {
        // The starting position (all but centre) is fully symmetric.
        let b = Board::english_start();
        let (canon, _) = canonical(b.pegs);
        assert_eq!(canon, b.pegs);
    }

    #[test]
    fn canonical_is_invariant_under_prior_transform() {
        let b = Board::english_start();
        let mv = b.generate_moves()[0];
        let after = b.apply_move(mv);
        let (canon_a, _) = canonical(after.pegs);
        for sym in ALL {
            let rotated = permute_mask(sym, after.pegs);
            let (canon_b, _) = canonical(rotated);
            assert_eq!(canon_a, canon_b);
        }
    }

    #[test]
    fn permute_move_round_trips_through_inverse() {
        let mv = crate::board::Move::new(16, 17, 18);
        for sym in ALL {
            let transformed = permute_move(sym, mv);
            let back = permute_move(sym.inverse(), transformed);
            assert_eq!(back, mv);
        }
    }

    #[test]
    fn canonical_key_falls_back_to_pegs_on_arbitrary_boards() {
        let valid = (1u64 << 10) | (1u64 << 16) | (1u64 << 24);
        let pegs = (1u64 << 10) | (1u64 << 16);
        let b = Board::new(pegs, valid).unwrap();
        assert_eq!(canonical_key(&b), pegs);
    }

    #[test]
    fn canonical_key_matches_canonical_on_english_boards() {
        let b = Board::english_start();
        assert_eq!(canonical_key(&b), canonical(b.pegs).0);
    }
}
