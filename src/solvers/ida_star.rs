//! IDA* (spec §4.F): iterative deepening on an `f = g + h` bound. Each
//! iteration is a plain DFS pruned at the bound; the next bound is the
//! smallest `f` that exceeded the current one, so the search never
//! re-explores a node at a shallower bound than necessary.

use std::time::Instant;

use tracing::debug;

use crate::board::Board;
use crate::heuristics::{pagoda_allows, pagoda_allows_soft, peg_count_bound};
use crate::symmetry::canonical_key;
use crate::types::{Deadline, EngineOpts, SolveOutcome, Solution, SolverStats};

use super::order_moves;

fn pagoda_ok(board: &Board) -> bool {
    if !board.is_english() {
        return true;
    }
    if board.peg_count() > 15 {
        pagoda_allows(board, crate::board::CENTER)
    } else {
        pagoda_allows_soft(board)
    }
}

enum ProbeResult {
    Solved(Solution),
    NextBound(i64),
    TimedOut,
    NoSuccessor,
}

pub fn solve(board: &Board, opts: &EngineOpts) -> SolveOutcome {
    let start_time = Instant::now();
    let mut stats = SolverStats::default();
    debug!(pegs = board.peg_count(), "ida-star: starting");

    let mut bound = peg_count_bound(board);
    let mut path = Vec::new();

    loop {
        if opts.deadline.is_past() {
            stats.time_ms = start_time.elapsed().as_millis() as u64;
            return SolveOutcome::TimedOut(stats);
        }
        let mut visited = std::collections::HashSet::new();
        let probe = probe(
            board,
            0,
            bound,
            &mut path,
            &mut visited,
            &mut stats,
            opts.deadline,
            opts.max_depth,
        );
        match probe {
            ProbeResult::Solved(solution) => {
                stats.time_ms = start_time.elapsed().as_millis() as u64;
                stats.record_solution(solution.len());
                return SolveOutcome::Solved(solution);
            }
            ProbeResult::TimedOut => {
                stats.time_ms = start_time.elapsed().as_millis() as u64;
                return SolveOutcome::TimedOut(stats);
            }
            ProbeResult::NoSuccessor => {
                stats.time_ms = start_time.elapsed().as_millis() as u64;
                return SolveOutcome::NoSolution(stats);
            }
            ProbeResult::NextBound(next) => {
                if next <= bound {
                    stats.time_ms = start_time.elapsed().as_millis() as u64;
                    return SolveOutcome::NoSolution(stats);
                }
                bound = next;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn probe(
    board: &Board,
    g: i64,
    bound: i64,
    path: &mut Solution,
    visited: &mut std::collections::HashSet<u64>,
    stats: &mut SolverStats,
    deadline: Deadline,
    max_depth: u32,
) -> ProbeResult {
    if deadline.is_past() {
        return ProbeResult::TimedOut;
    }
    let h = peg_count_bound(board);
    let f = g + h;
    if f > bound {
        return ProbeResult::NextBound(f);
    }
    stats.visited += 1;
    stats.max_depth = stats.max_depth.max(path.len() as u32);

    if board.peg_count() == 1 {
        return ProbeResult::Solved(path.clone());
    }
    if path.len() as u32 >= max_depth {
        return ProbeResult::NoSuccessor;
    }

    let key = canonical_key(board);
    if visited.contains(&key) {
        stats.pruned += 1;
        return ProbeResult::NoSuccessor;
    }
    visited.insert(key);

    if !pagoda_ok(board) {
        stats.pruned += 1;
        return ProbeResult::NoSuccessor;
    }

    let moves = board.generate_moves();
    if moves.is_empty() {
        return ProbeResult::NoSuccessor;
    }

    let mut min_next = i64::MAX;
    let mut any_successor = false;
    for mv in order_moves(board, moves) {
        let next = board.apply_move(mv);
        path.push(mv);
        match probe(&next, g + 1, bound, path, visited, stats, deadline, max_depth) {
            ProbeResult::Solved(solution) => return ProbeResult::Solved(solution),
            ProbeResult::TimedOut => return ProbeResult::TimedOut,
            ProbeResult::NextBound(next_bound) => {
                any_successor = true;
                min_next = min_next.min(next_bound);
                path.pop();
            }
            ProbeResult::NoSuccessor => {
                path.pop();
            }
        }
    }

    if any_successor {
        ProbeResult::NextBound(min_next)
    } else {
        ProbeResult::NoSuccessor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, ENGLISH_VALID_MASK};
    use crate::verify::verify;

    #[test]
    fn solves_the_minimal_two_peg_scenario() {
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let outcome = solve(&board, &EngineOpts::default());
        match outcome {
            SolveOutcome::Solved(moves) => {
                assert_eq!(moves.len(), 1);
                assert!(verify(&board, &moves, None).is_ok());
            }
            _ => panic!("expected a solution"),
        }
    }

    #[test]
    fn reports_no_solution_on_an_unsolvable_position() {
        let valid = (1u64 << 10) | (1u64 << 16) | (1u64 << 24) | (1u64 << 32) | (1u64 << 38);
        let pegs = (1u64 << 10) | (1u64 << 38);
        let board = Board::new(pegs, valid).unwrap();
        let outcome = solve(&board, &EngineOpts::default());
        assert!(matches!(outcome, SolveOutcome::NoSolution(_)));
    }

    #[test]
    fn solves_a_block_and_produces_a_verified_path() {
        let mut pegs = 0u64;
        for pos in [16u8, 17, 18, 23, 24, 25, 30, 31] {
            pegs |= 1u64 << pos;
        }
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let opts = EngineOpts::default()
            .with_deadline(Deadline::after(std::time::Duration::from_secs(10)));
        let outcome = solve(&board, &opts);
        if let SolveOutcome::Solved(moves) = outcome {
            assert!(verify(&board, &moves, None).is_ok());
        } else {
            panic!("expected a solution for the block");
        }
    }

    #[test]
    fn timed_out_deadline_is_honored() {
        let board = Board::english_start();
        let opts = EngineOpts::default().with_deadline(Deadline::elapsed());
        let outcome = solve(&board, &opts);
        assert!(matches!(outcome, SolveOutcome::TimedOut(_)));
    }
}
