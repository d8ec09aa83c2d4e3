//! Governor (spec §4.G): classify the position, dispatch to the one engine
//! that fits its shape, and fall back through a short ladder if that engine
//! fails or times out. Grounded in `original_source/solvers/governor.py`'s
//! `_analyze_position` / `_choose_solver` / `_try_fallbacks` trio — the
//! thresholds and dispatch order below are a direct port of that file.

use std::time::Duration;

use tracing::{debug, info};

use crate::board::{pos_to_coords, Board};
use crate::error::SolverError;
use crate::heuristics::pagoda_value;
use crate::pdb::PatternDb;
use crate::progress::{ProgressEvent, ProgressSender};
use crate::solvers::{beam, dfs, ida_star, pattern_astar};
use crate::store::{SolutionStore, SolveMeta};
use crate::types::{Deadline, EngineKind, EngineOpts, SolveOutcome, Solution};
use crate::verify::verify;

/// The characteristics the Governor classifies a position by before
/// picking an engine.
#[derive(Debug, Clone, Copy)]
struct Analysis {
    peg_count: u32,
    moves_count: usize,
    mobility: f64,
    #[allow(dead_code)]
    pagoda: u32,
    #[allow(dead_code)]
    center_dist: f64,
    #[allow(dead_code)]
    complexity: f64,
    is_medium: bool,
    is_hard: bool,
}

fn analyze(board: &Board) -> Analysis {
    let peg_count = board.peg_count();
    let moves = board.generate_moves();
    let moves_count = moves.len();
    let mobility = moves_count as f64 / peg_count.max(1) as f64;
    let complexity = peg_count as f64 / moves_count.max(1) as f64;

    Analysis {
        peg_count,
        moves_count,
        mobility,
        pagoda: pagoda_value(board),
        center_dist: avg_distance_to_center(board),
        complexity,
        is_medium: (10..=20).contains(&peg_count),
        is_hard: peg_count > 20 || mobility < 0.5,
    }
}

fn avg_distance_to_center(board: &Board) -> f64 {
    if board.peg_count() == 0 {
        return 0.0;
    }
    let mut total = 0u32;
    let mut count = 0u32;
    let mut bits = board.pegs;
    while bits != 0 {
        let pos = bits.trailing_zeros() as u8;
        bits &= bits - 1;
        let (row, col) = pos_to_coords(pos);
        total += row.abs_diff(3) as u32 + col.abs_diff(3) as u32;
        count += 1;
    }
    total as f64 / count as f64
}

/// One candidate engine choice: its kind and the `EngineOpts` it should
/// run with (deadline is filled in by the caller once a per-engine budget
/// is computed).
#[derive(Debug, Clone, Copy)]
struct Choice {
    kind: EngineKind,
    beam_width: usize,
}

fn choose(analysis: &Analysis, pdb_available: bool) -> Choice {
    if analysis.peg_count < 10 && analysis.mobility > 0.3 {
        return Choice { kind: EngineKind::Dfs, beam_width: 0 };
    }
    if analysis.mobility > 1.5 {
        return Choice { kind: EngineKind::Beam, beam_width: 300 };
    }
    if analysis.is_medium {
        if pdb_available {
            return Choice { kind: EngineKind::PatternAStar, beam_width: 0 };
        }
        return Choice { kind: EngineKind::Beam, beam_width: 250 };
    }
    if analysis.is_hard {
        if analysis.peg_count > 25 {
            return Choice { kind: EngineKind::IdaStar, beam_width: 0 };
        }
        return Choice { kind: EngineKind::Beam, beam_width: 400 };
    }
    let beam_width = if analysis.peg_count > 25 { 300 } else { 200 };
    Choice { kind: EngineKind::Beam, beam_width }
}

fn fallback_ladder(primary: EngineKind, pdb_available: bool) -> Vec<Choice> {
    let mut ladder = Vec::new();
    if primary != EngineKind::Dfs {
        ladder.push(Choice { kind: EngineKind::Dfs, beam_width: 0 });
    }
    if primary != EngineKind::Beam {
        ladder.push(Choice { kind: EngineKind::Beam, beam_width: 300 });
    }
    if primary != EngineKind::IdaStar {
        ladder.push(Choice { kind: EngineKind::IdaStar, beam_width: 0 });
    }
    if primary != EngineKind::PatternAStar && pdb_available {
        ladder.push(Choice { kind: EngineKind::PatternAStar, beam_width: 0 });
    }
    ladder
}

fn run(board: &Board, choice: Choice, opts: &EngineOpts, pdb: Option<&PatternDb>) -> SolveOutcome {
    let mut sub_opts = *opts;
    if choice.beam_width > 0 {
        sub_opts.beam_width = choice.beam_width;
    }
    match choice.kind {
        EngineKind::Dfs => dfs::solve(board, &sub_opts),
        EngineKind::Beam => beam::solve(board, &sub_opts),
        EngineKind::IdaStar => ida_star::solve(board, &sub_opts),
        EngineKind::PatternAStar => pattern_astar::solve(board, &sub_opts, pdb),
        _ => unreachable!("governor only dispatches to Dfs/Beam/IdaStar/PatternAStar"),
    }
}

/// Classify `board` and run the chosen engine, falling back through a
/// short ladder on failure or timeout. Consults `store` first and stores
/// any freshly verified solution back into it.
pub fn solve(
    board: &Board,
    opts: &EngineOpts,
    store: &mut SolutionStore,
    pdb: Option<&PatternDb>,
    progress: &ProgressSender,
) -> Result<Solution, SolverError> {
    progress.send(ProgressEvent::EngineStarted { engine: EngineKind::Lookup });
    if let Some(moves) = store.lookup(board) {
        debug!(moves = moves.len(), "governor: lookup hit");
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

    let analysis = analyze(board);
    let pdb_available = pdb.is_some() && board.is_english();
    let primary = choose(&analysis, pdb_available);
    info!(
        pegs = analysis.peg_count,
        mobility = analysis.mobility,
        engine = primary.kind.name(),
        "governor: dispatching"
    );

    let total_budget = opts.deadline.remaining();
    let primary_budget = total_budget
        .mul_f64(0.7)
        .min(Duration::from_secs(30));
    let primary_deadline = Deadline::after(primary_budget.min(opts.deadline.remaining()));
    let primary_opts = opts.with_deadline(primary_deadline);

    let mut proven = false;

    let attempt_start = std::time::Instant::now();
    let (solution, was_proven) =
        try_engine(board, primary, &primary_opts, pdb, opts.target, progress);
    proven = proven || was_proven;
    if let Some(solution) = solution {
        let meta = SolveMeta::new(primary.kind, attempt_start.elapsed().as_millis() as u64);
        store.insert_with_meta(board, &solution, Some(meta));
        if let Err(err) = store.save() {
            tracing::warn!(%err, "solution store save failed, continuing in-memory");
        }
        return Ok(solution);
    }

    for choice in fallback_ladder(primary.kind, pdb_available) {
        if opts.deadline.is_past() {
            break;
        }
        let remaining = opts.deadline.remaining().min(Duration::from_secs(20));
        let sub_opts = opts.with_deadline(Deadline::after(remaining));
        let attempt_start = std::time::Instant::now();
        let (solution, was_proven) =
            try_engine(board, choice, &sub_opts, pdb, opts.target, progress);
        proven = proven || was_proven;
        if let Some(solution) = solution {
            let meta = SolveMeta::new(choice.kind, attempt_start.elapsed().as_millis() as u64);
            store.insert_with_meta(board, &solution, Some(meta));
            if let Err(err) = store.save() {
                tracing::warn!(%err, "solution store save failed, continuing in-memory");
            }
            return Ok(solution);
        }
    }

    if proven {
        Err(SolverError::ProvenUnsolvable)
    } else {
        Err(SolverError::NoSolution)
    }
}

/// Runs `choice` and returns a verified solution, or `None` with a flag for
/// whether this attempt *proved* unsolvability (Dfs is the only choice the
/// Governor ever dispatches that exhausts its whole reachable state space;
/// Beam/IdaStar/PatternAStar giving up proves nothing).
fn try_engine(
    board: &Board,
    choice: Choice,
    opts: &EngineOpts,
    pdb: Option<&PatternDb>,
    target: Option<u8>,
    progress: &ProgressSender,
) -> (Option<Solution>, bool) {
    progress.send(ProgressEvent::EngineStarted { engine: choice.kind });
    match run(board, choice, opts, pdb) {
        SolveOutcome::Solved(moves) if verify(board, &moves, target).is_ok() => {
            progress.send(ProgressEvent::EngineSucceeded {
                engine: choice.kind,
                move_count: moves.len() as u32,
            });
            (Some(moves), false)
        }
        SolveOutcome::Solved(_) => {
            progress.send(ProgressEvent::EngineFailed {
                engine: choice.kind,
                stats: Default::default(),
            });
            (None, false)
        }
        SolveOutcome::NoSolution(stats) => {
            let proven = choice.kind == EngineKind::Dfs;
            progress.send(ProgressEvent::EngineFailed { engine: choice.kind, stats });
            (None, proven)
        }
        SolveOutcome::TimedOut(stats) => {
            progress.send(ProgressEvent::EngineFailed { engine: choice.kind, stats });
            (None, false)
        }
    }
}
