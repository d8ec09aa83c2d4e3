//! Solution verification: replays a move sequence against a starting board
//! and confirms it is legal end to end and actually terminal.
//!
//! Every solver hands its output through [`verify`] before a meta-solver or
//! the store will accept it (spec §4.E) — a solver claiming success with a
//! sequence that doesn't actually check out is a bug, not a result.

use crate::board::{pos_to_coords, Board, Move};
use crate::error::SolverError;

/// Replays `moves` against `start` and confirms the result is a legal,
/// single-peg-remaining finish.
///
/// An empty move list is valid exactly when `start` is already solved
/// (`peg_count() == 1`) — a position handed straight to the verifier
/// without a single jump needed.
///
/// When `require_target` is `Some(cell)`, the surviving peg must end on
/// that cell; otherwise any single surviving peg counts as solved.
pub fn verify(
    start: &Board,
    moves: &[Move],
    require_target: Option<u8>,
) -> Result<(), SolverError> {
    if moves.is_empty() {
        return if start.is_solved() {
            Ok(())
        } else {
            Err(SolverError::ValidationFailed)
        };
    }

    let mut board = *start;
    for mv in moves {
        if !is_in_mask(board.valid, mv.from)
            || !is_in_mask(board.valid, mv.over)
            || !is_in_mask(board.valid, mv.to)
        {
            return Err(SolverError::ValidationFailed);
        }
        if !board.has_peg(mv.from) || !board.has_peg(mv.over) || board.has_peg(mv.to) {
            return Err(SolverError::ValidationFailed);
        }
        if !is_straight_jump(mv) {
            return Err(SolverError::ValidationFailed);
        }
        board = board.apply_move(*mv);
    }

    if board.pegs == 0 {
        return Err(SolverError::ValidationFailed);
    }
    if board.peg_count() != 1 {
        return Err(SolverError::ValidationFailed);
    }
    if let Some(target) = require_target {
        if !board.is_solved_at(target) {
            return Err(SolverError::ValidationFailed);
        }
    }
    Ok(())
}

#[inline]
fn is_in_mask(mask: u64, pos: u8) -> bool {
    pos < 49 && mask & (1u64 << pos) != 0
}

/// Whether `from`, `over`, `to` lie on one straight line, two cells apart,
/// with `over` exactly at the midpoint — the collinearity and adjacency
/// constraint a forged move could satisfy on occupancy alone but not on
/// geometry (spec §4.E point (d)).
fn is_straight_jump(mv: &Move) -> bool {
    let (fr, fc) = pos_to_coords(mv.from);
    let (or, oc) = pos_to_coords(mv.over);
    let (tr, tc) = pos_to_coords(mv.to);
    let dr = tr as i8 - fr as i8;
    let dc = tc as i8 - fc as i8;
    if dr.abs() + dc.abs() != 2 || (dr != 0 && dc != 0) {
        return false;
    }
    let mid_r = fr as i8 + dr / 2;
    let mid_c = fc as i8 + dc / 2;
    or as i8 == mid_r && oc as i8 == mid_c
}
