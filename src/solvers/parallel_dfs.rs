//! Parallel DFS (spec §4.F): the first level of moves is the work queue,
//! one worker thread per available core pulls root moves from a shared
//! cursor and runs DFS-memo underneath it with a private memo, and the
//! first worker to finish a solution stops every other worker. Grounded in
//! the teacher's root-splitting shape (`engine::solve_range_with`): a
//! `flume` bounded channel for results, [`crate::work::NonceSource`] to
//! hand out root-move indices, and [`crate::work::HitStop`] as the shared
//! cancellation flag.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use flume::{Receiver, Sender};
use tracing::debug;

use crate::board::{Board, Move};
use crate::heuristics::{pagoda_allows, pagoda_allows_soft};
use crate::symmetry::canonical_key;
use crate::types::{Deadline, EngineOpts, SolveOutcome, Solution, SolverStats};
use crate::work::{HitStop, NonceSource};

use super::order_moves;

fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

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

pub fn solve(board: &Board, opts: &EngineOpts) -> SolveOutcome {
    let start_time = Instant::now();
    let mut stats = SolverStats::default();

    let root_moves = order_moves(board, board.generate_moves());
    if root_moves.is_empty() {
        stats.time_ms = start_time.elapsed().as_millis() as u64;
        return if board.peg_count() == 1 {
            stats.record_solution(0);
            SolveOutcome::Solved(Vec::new())
        } else {
            SolveOutcome::NoSolution(stats)
        };
    }

    let threads = worker_count().min(root_moves.len());
    debug!(threads, roots = root_moves.len(), "parallel-dfs: starting");

    let cursor = Arc::new(NonceSource::new(0));
    let stop = Arc::new(HitStop::new(1).expect("hit limit 1 is valid"));
    let (tx, rx): (Sender<WorkerOutcome>, Receiver<WorkerOutcome>) =
        flume::bounded(threads.max(1));
    let root_moves = Arc::new(root_moves);
    let deadline = opts.deadline;

    let mut handles = Vec::with_capacity(threads);
    for _ in 0..threads {
        let board = *board;
        let root_moves = root_moves.clone();
        let cursor = cursor.clone();
        let stop = stop.clone();
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            worker_loop(board, root_moves, cursor, stop, tx, deadline);
        }));
    }
    drop(tx);

    let mut best: Option<WorkerOutcome> = None;
    let mut any_timed_out = false;
    while let Ok(outcome) = rx.recv() {
        match &outcome {
            WorkerOutcome::Solved(_) => {
                best = Some(outcome);
                break;
            }
            WorkerOutcome::TimedOut => any_timed_out = true,
            WorkerOutcome::Exhausted => {}
        }
    }
    stop.force_stop();
    for handle in handles {
        let _ = handle.join();
    }

    stats.time_ms = start_time.elapsed().as_millis() as u64;
    match best {
        Some(WorkerOutcome::Solved(solution)) => {
            stats.record_solution(solution.len());
            SolveOutcome::Solved(solution)
        }
        _ if any_timed_out => SolveOutcome::TimedOut(stats),
        _ => SolveOutcome::NoSolution(stats),
    }
}

enum WorkerOutcome {
    Solved(Solution),
    TimedOut,
    Exhausted,
}

fn worker_loop(
    board: Board,
    root_moves: Arc<Vec<Move>>,
    cursor: Arc<NonceSource>,
    stop: Arc<HitStop>,
    tx: Sender<WorkerOutcome>,
    deadline: Deadline,
) {
    loop {
        if stop.should_stop() {
            return;
        }
        let idx = cursor.fetch() as usize;
        if idx >= root_moves.len() {
            let _ = tx.send(WorkerOutcome::Exhausted);
            return;
        }
        let mv = root_moves[idx];
        let next = board.apply_move(mv);
        let mut memo: HashSet<u64> = HashSet::new();
        let mut path = vec![mv];
        match dfs(&next, &mut path, &mut memo, deadline, &stop) {
            Branch::Solved(solution) => {
                stop.record_hit();
                let _ = tx.send(WorkerOutcome::Solved(solution));
                return;
            }
            Branch::TimedOut => {
                let _ = tx.send(WorkerOutcome::TimedOut);
                return;
            }
            Branch::Cancelled => return,
            Branch::Exhausted => {
                // this root move is a dead end; pull the next one
            }
        }
    }
}

enum Branch {
    Solved(Solution),
    TimedOut,
    Cancelled,
    Exhausted,
}

fn dfs(
    board: &Board,
    path: &mut Solution,
    memo: &mut HashSet<u64>,
    deadline: Deadline,
    stop: &HitStop,
) -> Branch {
    if stop.should_stop() {
        return Branch::Cancelled;
    }
    if deadline.is_past() {
        return Branch::TimedOut;
    }
    if board.peg_count() == 1 {
        return Branch::Solved(path.clone());
    }

    let key = canonical_key(board);
    if memo.contains(&key) {
        return Branch::Exhausted;
    }

    if board.is_english() && !pagoda_ok(board) {
        memo.insert(key);
        return Branch::Exhausted;
    }

    let moves = board.generate_moves();
    if moves.is_empty() {
        memo.insert(key);
        return Branch::Exhausted;
    }

    for mv in order_moves(board, moves) {
        let next = board.apply_move(mv);
        path.push(mv);
        match dfs(&next, path, memo, deadline, stop) {
            Branch::Solved(solution) => return Branch::Solved(solution),
            Branch::TimedOut => return Branch::TimedOut,
            Branch::Cancelled => return Branch::Cancelled,
            Branch::Exhausted => {
                path.pop();
            }
        }
    }

    memo.insert(key);
    Branch::Exhausted
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
    fn solves_the_full_english_board() {
        let board = Board::english_start();
        let opts = EngineOpts::default()
            .with_deadline(crate::types::Deadline::after(std::time::Duration::from_secs(20)));
        let outcome = solve(&board, &opts);
        if let SolveOutcome::Solved(moves) = outcome {
            assert!(verify(&board, &moves, None).is_ok());
        } else {
            panic!("expected parallel dfs to solve the full board");
        }
    }

    #[test]
    fn already_solved_board_returns_an_empty_solution() {
        let board = Board::english_goal();
        let outcome = solve(&board, &EngineOpts::default());
        assert!(matches!(outcome, SolveOutcome::Solved(ref m) if m.is_empty()));
    }
}
