//! Parallel Beam (spec §4.F): each layer's expansion is split across worker
//! threads behind a shared `Mutex`-guarded visited set, mirroring the
//! teacher's dedup-behind-a-lock shape (`equix::solver::equix_solve_stream`);
//! the sort-and-truncate-to-width reduction stays serial between layers,
//! since it needs every thread's candidates before it can pick the best
//! `beam_width`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tracing::debug;

use crate::board::Board;
use crate::heuristics::evaluate;
use crate::symmetry::canonical_key;
use crate::types::{EngineOpts, SolveOutcome, Solution, SolverStats};

fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(1)
}

pub fn solve(board: &Board, opts: &EngineOpts) -> SolveOutcome {
    let start_time = Instant::now();
    let mut stats = SolverStats::default();
    let threads = worker_count();
    debug!(
        pegs = board.peg_count(),
        width = opts.beam_width,
        threads,
        "parallel-beam: starting"
    );

    let mut beam: Vec<(Board, Solution)> = vec![(*board, Vec::new())];
    let visited: Arc<Mutex<HashSet<u64>>> = Arc::new(Mutex::new(HashSet::from([
        canonical_key(board)
    ])));

    for depth in 0..opts.max_depth {
        if beam.is_empty() {
            break;
        }
        if opts.deadline.is_past() {
            stats.time_ms = start_time.elapsed().as_millis() as u64;
            return SolveOutcome::TimedOut(stats);
        }
        stats.max_depth = depth;
        stats.visited += beam.len() as u64;

        let candidates = expand_layer(&beam, &visited, threads);
        if candidates.is_empty() {
            break;
        }

        let mut candidates = candidates;
        candidates.sort_by_key(|(score, _, _)| *score);
        stats.pruned += candidates.len().saturating_sub(opts.beam_width);
        beam = candidates
            .into_iter()
            .take(opts.beam_width)
            .map(|(_, b, p)| (b, p))
            .collect();

        for (current, path) in beam.iter() {
            if current.peg_count() == 1 {
                stats.time_ms = start_time.elapsed().as_millis() as u64;
                stats.record_solution(path.len());
                return SolveOutcome::Solved(path.clone());
            }
        }
    }

    stats.time_ms = start_time.elapsed().as_millis() as u64;
    SolveOutcome::NoSolution(stats)
}

type Candidate = (i64, Board, Solution);

fn expand_layer(
    beam: &[(Board, Solution)],
    visited: &Arc<Mutex<HashSet<u64>>>,
    threads: usize,
) -> Vec<Candidate> {
    let chunk_size = beam.len().div_ceil(threads).max(1);
    let results: Arc<Mutex<Vec<Candidate>>> = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for chunk in beam.chunks(chunk_size) {
        let chunk = chunk.to_vec();
        let visited = visited.clone();
        let results = results.clone();
        handles.push(thread::spawn(move || {
            let mut local = Vec::new();
            for (current, path) in &chunk {
                for mv in current.generate_moves() {
                    let next = current.apply_move(mv);
                    let key = canonical_key(&next);
                    {
                        let mut seen = match visited.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        if !seen.insert(key) {
                            continue;
                        }
                    }
                    let mut next_path = path.clone();
                    next_path.push(mv);
                    local.push((evaluate(&next), next, next_path));
                }
            }
            let mut out = match results.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            out.extend(local);
        }));
    }
    for handle in handles {
        let _ = handle.join();
    }

    Arc::try_unwrap(results)
        .map(|m| m.into_inner().unwrap_or_default())
        .unwrap_or_default()
}
