//! Zobrist-DFS (spec §4.F): DFS-memo's shape with the memo keyed by Zobrist
//! hash instead of canonical form, trading rare collisions for an O(1)
//! memo key instead of the eight-way canonicalisation pass.

use std::collections::HashSet;
use std::time::Instant;

use tracing::debug;

use crate::heuristics::{pagoda_allows, pagoda_allows_soft};
use crate::types::{Deadline, EngineOpts, SolveOutcome, Solution, SolverStats};
use crate::zobrist::ZobristBoard;

use super::order_moves;

pub fn solve(board: &crate::board::Board, opts: &EngineOpts) -> SolveOutcome {
    let start = Instant::now();
    let zb = ZobristBoard::new(*board);
    let mut memo: HashSet<u64> = HashSet::new();
    let mut stats = SolverStats::default();
    let mut path = Vec::new();

    debug!(pegs = board.peg_count(), "zobrist-dfs: starting");

    let outcome = dfs(&zb, &mut path, &mut memo, &mut stats, opts.deadline);
    stats.time_ms = start.elapsed().as_millis() as u64;

    match outcome {
        DfsResult::Solved(solution) => {
            stats.record_solution(solution.len());
            SolveOutcome::Solved(solution)
        }
        DfsResult::TimedOut => SolveOutcome::TimedOut(stats),
        DfsResult::Exhausted => SolveOutcome::NoSolution(stats),
    }
}

enum DfsResult {
    Solved(Solution),
    TimedOut,
    Exhausted,
}

fn dfs(
    zb: &ZobristBoard,
    path: &mut Solution,
    memo: &mut HashSet<u64>,
    stats: &mut SolverStats,
    deadline: Deadline,
) -> DfsResult {
    if deadline.is_past() {
        return DfsResult::TimedOut;
    }
    stats.visited += 1;
    stats.max_depth = stats.max_depth.max(path.len() as u32);

    let board = &zb.board;
    if board.peg_count() == 1 {
        return DfsResult::Solved(path.clone());
    }

    if memo.contains(&zb.hash) {
        stats.pruned += 1;
        return DfsResult::Exhausted;
    }

    if board.is_english() {
        let allows = if board.peg_count() > 15 {
            pagoda_allows(board, crate::board::CENTER)
        } else {
            pagoda_allows_soft(board)
        };
        if !allows {
            memo.insert(zb.hash);
            stats.pruned += 1;
            return DfsResult::Exhausted;
        }
    }

    let moves = board.generate_moves();
    if moves.is_empty() {
        memo.insert(zb.hash);
        return DfsResult::Exhausted;
    }

    for mv in order_moves(board, moves) {
        let next = zb.apply_move(mv);
        path.push(mv);
        match dfs(&next, path, memo, stats, deadline) {
            DfsResult::Solved(solution) => return DfsResult::Solved(solution),
            DfsResult::TimedOut => return DfsResult::TimedOut,
            DfsResult::Exhausted => {
                path.pop();
            }
        }
    }

    memo.insert(zb.hash);
    DfsResult::Exhausted
}
