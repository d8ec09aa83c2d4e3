//! DFS-memo (spec §4.F): recursive depth-first search with a memo of
//! canonical keys proven unsolvable from here, optional Pagoda pruning, and
//! the shared move tie-break.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, trace};

use crate::board::Board;
use crate::heuristics::{pagoda_allows, pagoda_allows_soft};
use crate::symmetry::canonical_key;
use crate::types::{Deadline, EngineOpts, SolveOutcome, Solution, SolverStats};

use super::order_moves;

/// Run DFS-memo from `board` with the given options.
///
/// A solver that exhausts every distinct canonical descendant without
/// finding a solution reports `NoSolution` — this is the one engine in the
/// family that can assert provable unsolvability (spec §4.F), because the
/// memo records every canonical state already shown to be a dead end.
pub fn solve(board: &Board, opts: &EngineOpts) -> SolveOutcome {
    let start = Instant::now();
    let mut memo: HashSet<u64> = HashSet::new();
    let mut stats = SolverStats::default();
    let mut path = Vec::new();

    debug!(pegs = board.peg_count(), "dfs-memo: starting");

    let outcome = dfs(board, &mut path, &mut memo, &mut stats, opts.deadline);
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
    board: &Board,
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

    if board.peg_count() == 1 {
        return DfsResult::Solved(path.clone());
    }

    let key = canonical_key(board);
    if memo.contains(&key) {
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
            memo.insert(key);
            stats.pruned += 1;
            trace!(pegs = board.peg_count(), "dfs-memo: pagoda prune");
            return DfsResult::Exhausted;
        }
    }

    let moves = board.generate_moves();
    if moves.is_empty() {
        memo.insert(key);
        return DfsResult::Exhausted;
    }

    for mv in order_moves(board, moves) {
        let next = board.apply_move(mv);
        path.push(mv);
        match dfs(&next, path, memo, stats, deadline) {
            DfsResult::Solved(solution) => return DfsResult::Solved(solution),
            DfsResult::TimedOut => return DfsResult::TimedOut,
            DfsResult::Exhausted => {
                path.pop();
            }
        }
    }

    memo.insert(key);
    DfsResult::Exhausted
}
