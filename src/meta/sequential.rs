//! Sequential (spec §4.G): run the whole solver family in one fixed order,
//! from cheapest to most exhaustive, and return the first verified hit.
//! Grounded in `original_source/solvers/sequential.py`'s `strategies` list:
//! every non-brute-force engine is skipped (not aborted) once the overall
//! deadline has passed, but Brute Force always gets its own guaranteed
//! minimum budget regardless of how much of the overall budget remains.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::board::Board;
use crate::error::SolverError;
use crate::pdb::PatternDb;
use crate::progress::{ProgressEvent, ProgressSender};
use crate::solvers::{
    astar, beam, bidirectional, dfs, ida_star, parallel_beam, parallel_dfs, pattern_astar,
    zobrist_dfs,
};
use crate::store::{SolutionStore, SolveMeta};
use crate::symmetry::canonical_key;
use crate::types::{Deadline, EngineKind, EngineOpts, SolveOutcome, Solution};
use crate::verify::verify;

/// Brute Force's guaranteed floor, applied even when the overall budget is
/// already exhausted.
const BRUTE_FORCE_MIN_BUDGET: Duration = Duration::from_secs(3600);

/// Try every engine in escalation order and return the first one whose
/// output passes [`crate::verify::verify`]. Exhaustive and Brute Force are
/// full unbounded-depth searches with Pagoda pruning disabled for Brute
/// Force, matching the source's "last resort, no shortcuts" framing.
pub fn solve(
    board: &Board,
    opts: &EngineOpts,
    store: &mut SolutionStore,
    pdb: Option<&PatternDb>,
    progress: &ProgressSender,
) -> Result<Solution, SolverError> {
    progress.send(ProgressEvent::EngineStarted { engine: EngineKind::Lookup });
    if let Some(moves) = store.lookup(board) {
        progress.send(ProgressEvent::EngineSucceeded {
            engine: EngineKind::Lookup,
            move_count: moves.len() as u32,
        });
        return Ok(moves);
    }
    progress.send(ProgressEvent::EngineFailed {
        engine: EngineKind::Lookup,
        stats: Default::default(),
    });

    let stages: &[EngineKind] = &[
        EngineKind::Dfs,
        EngineKind::Beam,
        EngineKind::ZobristDfs,
        EngineKind::AStar,
        EngineKind::PatternAStar,
        EngineKind::IdaStar,
        EngineKind::Bidirectional,
        EngineKind::ParallelDfs,
        EngineKind::ParallelBeam,
        EngineKind::Exhaustive,
        EngineKind::BruteForce,
    ];

    // Dfs, ZobristDfs, Exhaustive and Brute Force each exhaust their entire
    // reachable state space rather than merely running out of budget; once
    // any of them reports NoSolution (not TimedOut), the position is
    // provably unsolvable regardless of what later heuristic stages do.
    let mut proven = false;

    for &kind in stages {
        if kind != EngineKind::BruteForce && opts.deadline.is_past() {
            debug!(engine = kind.name(), "sequential: skipping, deadline passed");
            continue;
        }

        let exhaustive = matches!(
            kind,
            EngineKind::Dfs | EngineKind::ZobristDfs | EngineKind::Exhaustive | EngineKind::BruteForce
        );
        let stage_opts = stage_opts(kind, opts);
        progress.send(ProgressEvent::EngineStarted { engine: kind });
        let attempt_start = std::time::Instant::now();
        let outcome = run(kind, board, &stage_opts, pdb);

        match outcome {
            SolveOutcome::Solved(moves) if verify(board, &moves, opts.target).is_ok() => {
                progress.send(ProgressEvent::EngineSucceeded {
                    engine: kind,
                    move_count: moves.len() as u32,
                });
                let meta = SolveMeta::new(kind, attempt_start.elapsed().as_millis() as u64);
                store.insert_with_meta(board, &moves, Some(meta));
                if let Err(err) = store.save() {
                    tracing::warn!(%err, "solution store save failed, continuing in-memory");
                }
                return Ok(moves);
            }
            SolveOutcome::Solved(_) => {
                progress.send(ProgressEvent::EngineFailed {
                    engine: kind,
                    stats: Default::default(),
                });
            }
            SolveOutcome::NoSolution(stats) => {
                progress.send(ProgressEvent::EngineFailed { engine: kind, stats });
                proven = proven || exhaustive;
            }
            SolveOutcome::TimedOut(stats) => {
                progress.send(ProgressEvent::EngineFailed { engine: kind, stats });
            }
        }
    }

    progress.send(ProgressEvent::Exhausted);
    if proven {
        Err(SolverError::ProvenUnsolvable)
    } else {
        Err(SolverError::NoSolution)
    }
}

fn stage_opts(kind: EngineKind, opts: &EngineOpts) -> EngineOpts {
    match kind {
        EngineKind::Beam => opts.with_beam_width(500),
        EngineKind::ParallelBeam => opts.with_beam_width(500),
        EngineKind::Exhaustive => {
            let budget = opts.deadline.remaining().max(Duration::from_secs(60));
            opts.with_deadline(Deadline::after(budget))
        }
        EngineKind::BruteForce => {
            let budget = opts.deadline.remaining().max(BRUTE_FORCE_MIN_BUDGET);
            opts.with_deadline(Deadline::after(budget))
        }
        _ => *opts,
    }
}

fn run(kind: EngineKind, board: &Board, opts: &EngineOpts, pdb: Option<&PatternDb>) -> SolveOutcome {
    match kind {
        EngineKind::Dfs => dfs::solve(board, opts),
        EngineKind::Beam => beam::solve(board, opts),
        EngineKind::ZobristDfs => zobrist_dfs::solve(board, opts),
        EngineKind::AStar => astar::solve(board, opts, pdb),
        EngineKind::PatternAStar => pattern_astar::solve(board, opts, pdb),
        EngineKind::IdaStar => ida_star::solve(board, opts),
        EngineKind::Bidirectional => bidirectional::solve(board, opts),
        EngineKind::ParallelDfs => parallel_dfs::solve(board, opts),
        EngineKind::ParallelBeam => parallel_beam::solve(board, opts),
        EngineKind::Exhaustive => dfs::solve(board, opts),
        EngineKind::BruteForce => brute_force(board, opts),
        _ => unreachable!("sequential only dispatches the search-family engines"),
    }
}

/// A full DFS with no Pagoda pruning at all — the one engine in the family
/// that never discards a branch the invariant would have allowed, matching
/// the source's `BruteForceSolver` being the last resort with "no
/// shortcuts".
fn brute_force(board: &Board, opts: &EngineOpts) -> SolveOutcome {
    let start = std::time::Instant::now();
    let mut memo: HashSet<u64> = HashSet::new();
    let mut stats = crate::types::SolverStats::default();
    let mut path = Vec::new();

    let outcome = search(board, &mut path, &mut memo, &mut stats, opts.deadline);
    stats.time_ms = start.elapsed().as_millis() as u64;

    match outcome {
        BruteForceResult::Solved(solution) => {
            stats.record_solution(solution.len());
            SolveOutcome::Solved(solution)
        }
        BruteForceResult::TimedOut => SolveOutcome::TimedOut(stats),
        BruteForceResult::Exhausted => SolveOutcome::NoSolution(stats),
    }
}

enum BruteForceResult {
    Solved(Solution),
    TimedOut,
    Exhausted,
}

fn search(
    board: &Board,
    path: &mut Solution,
    memo: &mut HashSet<u64>,
    stats: &mut crate::types::SolverStats,
    deadline: Deadline,
) -> BruteForceResult {
    if deadline.is_past() {
        return BruteForceResult::TimedOut;
    }
    stats.visited += 1;
    stats.max_depth = stats.max_depth.max(path.len() as u32);

    if board.peg_count() == 1 {
        return BruteForceResult::Solved(path.clone());
    }

    let key = canonical_key(board);
    if memo.contains(&key) {
        stats.pruned += 1;
        return BruteForceResult::Exhausted;
    }

    let moves = board.generate_moves();
    if moves.is_empty() {
        memo.insert(key);
        return BruteForceResult::Exhausted;
    }

    for mv in crate::solvers::order_moves(board, moves) {
        let next = board.apply_move(mv);
        path.push(mv);
        match search(&next, path, memo, stats, deadline) {
            BruteForceResult::Solved(solution) => return BruteForceResult::Solved(solution),
            BruteForceResult::TimedOut => return BruteForceResult::TimedOut,
            BruteForceResult::Exhausted => {
                path.pop();
            }
        }
    }

    memo.insert(key);
    BruteForceResult::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ENGLISH_VALID_MASK;
    use crate::progress;

    #[test]
    fn lookup_hit_returns_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let mv = board.generate_moves()[0];
        store.insert(&board, &vec![mv]);

        let (tx, _rx) = progress::channel(8);
        let result = solve(&board, &EngineOpts::default(), &mut store, None, &tx);
        assert_eq!(result.unwrap(), vec![mv]);
    }

    #[test]
    fn escalates_through_engines_to_solve_a_small_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();

        let (tx, _rx) = progress::channel(8);
        let opts = EngineOpts::default()
            .with_deadline(Deadline::after(Duration::from_secs(5)));
        let result = solve(&board, &opts, &mut store, None, &tx).unwrap();
        assert!(verify(&board, &result, None).is_ok());
    }

    #[test]
    fn brute_force_alone_solves_the_minimal_scenario() {
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let opts = EngineOpts::default();
        match brute_force(&board, &opts) {
            SolveOutcome::Solved(moves) => assert!(verify(&board, &moves, None).is_ok()),
            _ => panic!("expected brute force to solve the minimal scenario"),
        }
    }

    #[test]
    fn unsolvable_position_exhausts_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let valid = (1u64 << 10) | (1u64 << 16) | (1u64 << 24) | (1u64 << 32) | (1u64 << 38);
        let pegs = (1u64 << 10) | (1u64 << 38);
        let board = Board::new(pegs, valid).unwrap();

        let (tx, _rx) = progress::channel(8);
        let opts = EngineOpts::default()
            .with_deadline(Deadline::after(Duration::from_secs(2)));
        let result = solve(&board, &opts, &mut store, None, &tx);
        assert!(matches!(result, Err(SolverError::ProvenUnsolvable)));
    }
}
