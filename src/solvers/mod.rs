//! The search family (spec §4.F): every engine shares [`crate::types::SolverStats`],
//! the verified [`crate::types::Solution`] result shape, and the move
//! tie-break ordering DFS-memo, Zobrist-DFS, and IDA* all apply identically
//! so their traversal order is deterministic and cross-comparable.

pub mod astar;
pub mod beam;
pub mod bidirectional;
pub mod dfs;
pub mod ida_star;
pub mod parallel_beam;
pub mod parallel_dfs;
pub mod pattern_astar;
pub mod zobrist_dfs;

use crate::board::{pos_to_coords, Board, Move, CENTER};
use crate::heuristics::PAGODA_WEIGHTS;

/// Sort `moves` by the shared tie-break (spec §4.F): destination Manhattan
/// distance to centre ascending, then the jumped-over cell's Pagoda weight
/// descending. Off the English cross the Pagoda term is always zero for
/// every cell, so the ordering degrades gracefully to distance-only.
pub fn order_moves(board: &Board, mut moves: Vec<Move>) -> Vec<Move> {
    let _ = board;
    moves.sort_by_key(|mv| {
        let (row, col) = pos_to_coords(mv.to);
        let (crow, ccol) = pos_to_coords(CENTER);
        let dist = row.abs_diff(crow) as i32 + col.abs_diff(ccol) as i32;
        let pagoda_weight = PAGODA_WEIGHTS[mv.over as usize] as i32;
        (dist, -pagoda_weight)
    });
    moves
}
