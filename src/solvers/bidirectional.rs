//! Bidirectional BFS (spec §4.F): a forward frontier from the start and a
//! backward frontier from a single-peg goal meet in the middle, trading
//! `O(b^d)` for two `O(b^(d/2))` searches. Only meaningful when a concrete
//! goal cell is known ([`EngineOpts::target`]) — without one there is
//! nothing to seed the backward frontier with, so the search degrades to a
//! plain forward BFS that stops at the first one-peg state it meets.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use tracing::debug;

use crate::board::{pos_to_coords, Board, Move};
use crate::types::{EngineOpts, SolveOutcome, Solution, SolverStats};

pub fn solve(board: &Board, opts: &EngineOpts) -> SolveOutcome {
    match opts.target {
        Some(cell) => bidirectional(board, cell, opts),
        None => forward_only(board, opts),
    }
}

fn forward_only(board: &Board, opts: &EngineOpts) -> SolveOutcome {
    let start_time = Instant::now();
    let mut stats = SolverStats::default();
    debug!(pegs = board.peg_count(), "bidirectional: forward-only, no target");

    let mut queue: VecDeque<(Board, Solution)> = VecDeque::new();
    let mut visited: HashSet<u64> = HashSet::new();
    visited.insert(board.pegs);
    queue.push_back((*board, Vec::new()));

    while let Some((current, path)) = queue.pop_front() {
        if opts.deadline.is_past() {
            stats.time_ms = start_time.elapsed().as_millis() as u64;
            return SolveOutcome::TimedOut(stats);
        }
        stats.visited += 1;
        stats.max_depth = stats.max_depth.max(path.len() as u32);
        if current.peg_count() == 1 {
            stats.time_ms = start_time.elapsed().as_millis() as u64;
            stats.record_solution(path.len());
            return SolveOutcome::Solved(path);
        }
        for mv in current.generate_moves() {
            let next = current.apply_move(mv);
            if visited.insert(next.pegs) {
                let mut next_path = path.clone();
                next_path.push(mv);
                queue.push_back((next, next_path));
            }
        }
    }

    stats.time_ms = start_time.elapsed().as_millis() as u64;
    SolveOutcome::NoSolution(stats)
}

/// Every `(predecessor, forward_move)` pair reachable by undoing one jump
/// into `board`: a hole-hole-peg triple along an axis becomes peg-peg-hole,
/// and the forward move that re-creates `board` from that predecessor is
/// `(from: far cell, over: middle cell, to: the hole we pivoted on)`.
fn reverse_candidates(board: &Board) -> Vec<(Board, Move)> {
    const DELTAS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
    let mut out = Vec::new();
    let mut holes = board.holes();
    while holes != 0 {
        let pivot = holes.trailing_zeros() as u8;
        holes &= holes - 1;
        let (row, col) = pos_to_coords(pivot);
        for (dr, dc) in DELTAS {
            let (mid_row, mid_col) = (row as i8 + dr, col as i8 + dc);
            let (far_row, far_col) = (row as i8 + 2 * dr, col as i8 + 2 * dc);
            if !(0..7).contains(&mid_row)
                || !(0..7).contains(&mid_col)
                || !(0..7).contains(&far_row)
                || !(0..7).contains(&far_col)
            {
                continue;
            }
            let mid = crate::board::coords_to_pos(mid_row as u8, mid_col as u8);
            let far = crate::board::coords_to_pos(far_row as u8, far_col as u8);
            if board.valid & (1u64 << mid) == 0 || board.valid & (1u64 << far) == 0 {
                continue;
            }
            if board.has_peg(mid) || !board.has_peg(far) {
                continue;
            }
            let mv = Move::new(far, mid, pivot);
            let predecessor = board.apply_move(mv);
            out.push((predecessor, mv));
        }
    }
    out
}

fn bidirectional(board: &Board, target_cell: u8, opts: &EngineOpts) -> SolveOutcome {
    let start_time = Instant::now();
    let mut stats = SolverStats::default();
    let goal = Board::new_unchecked(1u64 << target_cell, board.valid);
    debug!(
        pegs = board.peg_count(),
        target = target_cell,
        "bidirectional: starting"
    );

    if board.pegs == goal.pegs {
        stats.record_solution(0);
        return SolveOutcome::Solved(Vec::new());
    }

    let mut forward_queue: VecDeque<Board> = VecDeque::from([*board]);
    let mut forward_visited: HashMap<u64, Solution> = HashMap::from([(board.pegs, Vec::new())]);
    let mut backward_queue: VecDeque<Board> = VecDeque::from([goal]);
    let mut backward_visited: HashMap<u64, Solution> = HashMap::from([(goal.pegs, Vec::new())]);

    while !forward_queue.is_empty() || !backward_queue.is_empty() {
        if opts.deadline.is_past() {
            stats.time_ms = start_time.elapsed().as_millis() as u64;
            return SolveOutcome::TimedOut(stats);
        }

        if let Some(current) = forward_queue.pop_front() {
            stats.visited += 1;
            let path = forward_visited[&current.pegs].clone();
            for mv in current.generate_moves() {
                let next = current.apply_move(mv);
                let mut next_path = path.clone();
                next_path.push(mv);
                if let Some(back_path) = backward_visited.get(&next.pegs) {
                    let mut solution = next_path;
                    solution.extend(back_path.iter().rev().map(|m| m.reversed()));
                    stats.time_ms = start_time.elapsed().as_millis() as u64;
                    stats.record_solution(solution.len());
                    return SolveOutcome::Solved(solution);
                }
                if let std::collections::hash_map::Entry::Vacant(e) =
                    forward_visited.entry(next.pegs)
                {
                    e.insert(next_path);
                    forward_queue.push_back(next);
                }
            }
        }

        if let Some(current) = backward_queue.pop_front() {
            stats.visited += 1;
            let path = backward_visited[&current.pegs].clone();
            for (predecessor, fwd_move) in reverse_candidates(&current) {
                let mut next_path = path.clone();
                next_path.push(fwd_move);
                if let Some(fwd_path) = forward_visited.get(&predecessor.pegs) {
                    let mut solution = fwd_path.clone();
                    solution.extend(next_path.iter().rev().map(|m| m.reversed()));
                    stats.time_ms = start_time.elapsed().as_millis() as u64;
                    stats.record_solution(solution.len());
                    return SolveOutcome::Solved(solution);
                }
                if let std::collections::hash_map::Entry::Vacant(e) =
                    backward_visited.entry(predecessor.pegs)
                {
                    e.insert(next_path);
                    backward_queue.push_back(predecessor);
                }
            }
        }
    }

    stats.time_ms = start_time.elapsed().as_millis() as u64;
    SolveOutcome::NoSolution(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, ENGLISH_VALID_MASK, CENTER};
    use crate::verify::verify;

    #[test]
    fn solves_the_minimal_two_peg_scenario_without_a_target() {
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
    fn solves_the_minimal_scenario_to_an_explicit_target() {
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let opts = EngineOpts::default().with_target(18);
        let outcome = solve(&board, &opts);
        match outcome {
            SolveOutcome::Solved(moves) => {
                assert_eq!(moves.len(), 1);
                assert!(verify(&board, &moves, Some(18)).is_ok());
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
    fn solves_the_classic_start_to_center() {
        let board = Board::english_start();
        let opts = EngineOpts::default()
            .with_target(CENTER)
            .with_deadline(crate::types::Deadline::after(std::time::Duration::from_secs(15)));
        let outcome = solve(&board, &opts);
        if let SolveOutcome::Solved(moves) = outcome {
            assert!(verify(&board, &moves, Some(CENTER)).is_ok());
        } else {
            panic!("expected a solution to the classic start");
        }
    }
}
