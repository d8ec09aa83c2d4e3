//! Single-peg-solitaire endgame solver: a bit-parallel board engine,
//! Zobrist hashing, Pagoda/Pattern-DB pruning heuristics, a family of search
//! algorithms, two meta-solvers that pick among them, a verified solution
//! store, and the small utilities (notation, progress reporting) that tie
//! them together.
//!
//! The two entry points most callers need are [`solve`] (hand it a board
//! and a budget, get back a verified solution) and [`verify`] (check a move
//! sequence without running a search at all). [`SolveConfig`] is the richer
//! programmatic surface for callers that want to choose an engine, persist
//! results, or reuse a prebuilt pattern database across calls.

pub mod board;
pub mod error;
pub mod heuristics;
pub mod meta;
pub mod notation;
pub mod pdb;
pub mod progress;
pub mod solvers;
pub mod store;
pub mod symmetry;
pub mod types;
mod verify;
pub mod work;
pub mod zobrist;

use std::path::PathBuf;

use derive_builder::Builder;

pub use crate::board::{Board, Move};
pub use crate::error::{BoardError, SolverError, StoreError};
pub use crate::pdb::PatternDb;
pub use crate::progress::{ProgressEvent, ProgressReceiver, ProgressSender};
pub use crate::store::SolutionStore;
pub use crate::types::{Deadline, EngineKind, EngineOpts, SolveOutcome, Solution, SolverStats};

/// The programmatic configuration surface for [`solve_with_config`]: which
/// engine to dispatch to, the shared [`EngineOpts`] budget, and where the
/// solution store and pattern database (if any) live on disk.
///
/// Built with the owned [`derive_builder`] pattern, the same way the
/// teacher's own engine configs are assembled — call `.build_validated()`
/// rather than `.build()` so an empty or contradictory configuration is
/// rejected before a search ever starts.
#[derive(Builder, Debug, Clone)]
#[builder(pattern = "owned")]
pub struct SolveConfig {
    /// Which solver or meta-solver to run. Defaults to [`EngineKind::Governor`].
    #[builder(default = "EngineKind::Governor")]
    pub engine: EngineKind,
    #[builder(default)]
    pub opts: EngineOpts,
    /// Where the verified-solution cache lives. `None` keeps an in-memory
    /// store for the lifetime of one call and never touches disk.
    #[builder(default, setter(strip_option))]
    pub store_path: Option<PathBuf>,
    /// A prebuilt pattern database, loaded ahead of time so concurrent
    /// calls don't each pay its backward-BFS construction cost. `None`
    /// disables the Pattern-DB heuristic for engines that would use it.
    #[builder(default, setter(strip_option))]
    pub pdb_path: Option<PathBuf>,
    /// Buffer size for the progress channel opened during the solve.
    #[builder(default = "16")]
    pub progress_capacity: usize,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Governor,
            opts: EngineOpts::default(),
            store_path: None,
            pdb_path: None,
            progress_capacity: 16,
        }
    }
}

impl SolveConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if matches!(self.progress_capacity, Some(0)) {
            return Err("progress_capacity must be >= 1".into());
        }
        Ok(())
    }

    /// Validate and build, surfacing a rejected configuration as
    /// [`SolverError::InvalidConfig`] instead of `derive_builder`'s own
    /// uninitialised-field error type.
    pub fn build_validated(self) -> Result<SolveConfig, SolverError> {
        self.validate().map_err(SolverError::InvalidConfig)?;
        self.build().map_err(|e| SolverError::InvalidConfig(e.to_string()))
    }
}

/// Solve `board` within `opts`'s budget using the Governor meta-solver
/// (spec §6's two-entry-point CLI surface) against a throwaway in-memory
/// store and no pattern database. Equivalent to
/// `solve_with_config(board, &SolveConfig { opts: *opts, ..Default::default() })`
/// but without touching disk at all.
pub fn solve(board: &Board, opts: &EngineOpts) -> Result<Solution, SolverError> {
    let mut store = SolutionStore::open(ephemeral_store_path());
    let progress = progress::sink();
    meta::governor::solve(board, opts, &mut store, None, &progress)
}

/// The richer entry point: dispatch to whichever engine or meta-solver
/// `config.engine` names, optionally persisting to and loading from disk.
pub fn solve_with_config(board: &Board, config: &SolveConfig) -> Result<Solution, SolverError> {
    let mut store = match &config.store_path {
        Some(path) => SolutionStore::open(path.clone()),
        None => SolutionStore::open(ephemeral_store_path()),
    };
    let pdb = config.pdb_path.as_ref().map(|path| PatternDb::load_or_build(path));
    let (progress, _rx) = progress::channel(config.progress_capacity);

    dispatch(board, config.engine, &config.opts, &mut store, pdb.as_ref(), &progress)
}

fn dispatch(
    board: &Board,
    engine: EngineKind,
    opts: &EngineOpts,
    store: &mut SolutionStore,
    pdb: Option<&PatternDb>,
    progress: &ProgressSender,
) -> Result<Solution, SolverError> {
    use crate::solvers::{astar, beam, bidirectional, dfs, ida_star, parallel_beam, parallel_dfs, pattern_astar, zobrist_dfs};

    match engine {
        EngineKind::Governor => meta::governor::solve(board, opts, store, pdb, progress),
        EngineKind::Sequential => meta::sequential::solve(board, opts, store, pdb, progress),
        EngineKind::Lookup => store.lookup(board).ok_or(SolverError::NoSolution),
        other => {
            // Dfs/ZobristDfs/ParallelDfs exhaust every distinct canonical (or
            // Zobrist-keyed) descendant before reporting NoSolution — Pagoda
            // pruning only ever discards branches the admissible invariant has
            // ruled out, so that exhaustion is a sound proof of unsolvability,
            // not just a budget running out. Exhaustive and Brute Force reuse
            // the same engine.
            let provable = matches!(
                other,
                EngineKind::Dfs
                    | EngineKind::ZobristDfs
                    | EngineKind::ParallelDfs
                    | EngineKind::Exhaustive
                    | EngineKind::BruteForce
            );
            outcome_to_result(board, opts, provable, match other {
                EngineKind::Dfs => dfs::solve(board, opts),
                EngineKind::ZobristDfs => zobrist_dfs::solve(board, opts),
                EngineKind::AStar => astar::solve(board, opts, pdb),
                EngineKind::IdaStar => ida_star::solve(board, opts),
                EngineKind::Beam => beam::solve(board, opts),
                EngineKind::Bidirectional => bidirectional::solve(board, opts),
                EngineKind::PatternAStar => pattern_astar::solve(board, opts, pdb),
                EngineKind::ParallelDfs => parallel_dfs::solve(board, opts),
                EngineKind::ParallelBeam => parallel_beam::solve(board, opts),
                EngineKind::Exhaustive => dfs::solve(board, opts),
                EngineKind::BruteForce => dfs::solve(board, opts),
                EngineKind::Lookup | EngineKind::Governor | EngineKind::Sequential => unreachable!(),
            })
        }
    }
}

fn outcome_to_result(
    board: &Board,
    opts: &EngineOpts,
    provable: bool,
    outcome: SolveOutcome,
) -> Result<Solution, SolverError> {
    match outcome {
        SolveOutcome::Solved(moves) if crate::verify::verify(board, &moves, opts.target).is_ok() => {
            Ok(moves)
        }
        SolveOutcome::Solved(_) => Err(SolverError::ValidationFailed),
        SolveOutcome::NoSolution(_) if provable => Err(SolverError::ProvenUnsolvable),
        SolveOutcome::NoSolution(_) => Err(SolverError::NoSolution),
        SolveOutcome::TimedOut(_) => Err(SolverError::TimedOut),
    }
}

/// A path under the system temp directory unique to this process, used as
/// the backing file for a store the caller never asked to persist. The
/// store itself only ever touches it if something calls `.save()`.
fn ephemeral_store_path() -> PathBuf {
    std::env::temp_dir().join(format!("pegsolve-ephemeral-{}.json", std::process::id()))
}

/// Replay `moves` from `board` and report whether the result is a legal,
/// single-peg-remaining finish (spec §6's `verify(board, moves) -> bool`).
/// Every solver already runs this check internally before a result reaches
/// a caller; this is the same gate exposed directly for a move sequence
/// obtained any other way (loaded from a file, composed by hand).
pub fn verify(board: &Board, moves: &[Move]) -> bool {
    crate::verify::verify(board, moves, None).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ENGLISH_VALID_MASK;

    #[test]
    fn solve_finds_a_verified_solution_for_a_small_position() {
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let opts = EngineOpts::default()
            .with_deadline(Deadline::after(std::time::Duration::from_secs(5)));
        let solution = solve(&board, &opts).unwrap();
        assert!(verify(&board, &solution));
    }

    #[test]
    fn verify_rejects_an_empty_sequence_on_an_unsolved_board() {
        let board = Board::english_start();
        assert!(!verify(&board, &[]));
    }

    #[test]
    fn solve_with_config_dispatches_to_a_named_single_engine() {
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let config = SolveConfigBuilder::default()
            .engine(EngineKind::Dfs)
            .build_validated()
            .unwrap();
        let solution = solve_with_config(&board, &config).unwrap();
        assert!(verify(&board, &solution));
    }

    #[test]
    fn solve_config_builder_rejects_zero_progress_capacity() {
        let result = SolveConfigBuilder::default()
            .progress_capacity(0)
            .build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn dfs_engine_reports_proven_unsolvable_not_plain_no_solution() {
        let valid = (1u64 << 10) | (1u64 << 16) | (1u64 << 24) | (1u64 << 32) | (1u64 << 38);
        let pegs = (1u64 << 10) | (1u64 << 38);
        let board = Board::new(pegs, valid).unwrap();
        let config = SolveConfigBuilder::default()
            .engine(EngineKind::Dfs)
            .build_validated()
            .unwrap();
        let result = solve_with_config(&board, &config);
        assert!(matches!(result, Err(SolverError::ProvenUnsolvable)));
    }
}
