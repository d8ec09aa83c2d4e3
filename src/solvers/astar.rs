//! A* (spec §4.F): classic best-first search over a min-heap keyed by
//! `(f, insertionCounter)`, with an admissible heuristic that folds in the
//! Pattern Database when one is attached to an English-cross board.

use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use tracing::debug;

use crate::board::{Board, Move, CENTER};
use crate::heuristics::{pagoda_allows, pagoda_allows_soft, peg_count_bound};
use crate::pdb::PatternDb;
use crate::types::{Deadline, EngineOpts, SolveOutcome, Solution, SolverStats};

/// The admissible heuristic used by both A* and Pattern-A*: `max(h0, pdb)`
/// on the English cross when a Pattern Database is attached, `h0` otherwise.
pub fn heuristic(board: &Board, pdb: Option<&PatternDb>) -> i64 {
    let h0 = peg_count_bound(board);
    match pdb {
        Some(db) if board.is_english() => h0.max(db.heuristic(board) as i64),
        _ => h0,
    }
}

fn pagoda_ok(board: &Board) -> bool {
    if !board.is_english() {
        return true;
    }
    if board.peg_count() > 15 {
        pagoda_allows(board, CENTER)
    } else {
        pagoda_allows_soft(board)
    }
}

#[derive(PartialEq, Eq)]
struct OpenEntry {
    f: i64,
    counter: u64,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; we want the smallest `f` (ties by
        // earliest insertion) popped first, so reverse both fields.
        other.f.cmp(&self.f).then(other.counter.cmp(&self.counter))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub fn solve(board: &Board, opts: &EngineOpts, pdb: Option<&PatternDb>) -> SolveOutcome {
    let start_time = Instant::now();
    let mut stats = SolverStats::default();
    debug!(pegs = board.peg_count(), "a-star: starting");

    // Keyed by the literal peg mask, not the symmetry-canonical form: two
    // states that are D4 images of each other are still distinct nodes with
    // their own parent pointers, so a path reconstructed by walking
    // `came_from` back to the root always replays against the real board.
    let start_key = board.pegs;
    let mut boards: HashMap<u64, Board> = HashMap::new();
    let mut came_from: HashMap<u64, (u64, Move)> = HashMap::new();
    let mut best_g: HashMap<u64, u32> = HashMap::new();
    boards.insert(start_key, *board);
    best_g.insert(start_key, 0);

    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut counter = 0u64;
    open.push(OpenEntry {
        f: heuristic(board, pdb),
        counter,
    });
    let mut key_of_entry: HashMap<u64, u64> = HashMap::new();
    key_of_entry.insert(counter, start_key);
    counter += 1;

    while let Some(entry) = open.pop() {
        if opts.deadline.is_past() {
            stats.time_ms = start_time.elapsed().as_millis() as u64;
            return SolveOutcome::TimedOut(stats);
        }
        let Some(&key) = key_of_entry.get(&entry.counter) else {
            continue;
        };
        let Some(&g) = best_g.get(&key) else { continue };
        if entry.f > g as i64 + heuristic(&boards[&key], pdb) {
            // stale entry superseded by a better path already expanded
            continue;
        }
        let current = boards[&key];
        stats.visited += 1;
        stats.max_depth = stats.max_depth.max(g);

        if current.peg_count() == 1 {
            let path = reconstruct(&came_from, key, start_key);
            stats.time_ms = start_time.elapsed().as_millis() as u64;
            stats.record_solution(path.len());
            return SolveOutcome::Solved(path);
        }

        for mv in current.generate_moves() {
            let next = current.apply_move(mv);
            if !pagoda_ok(&next) {
                stats.pruned += 1;
                continue;
            }
            if next.peg_count() > 1 && next.is_dead() {
                stats.pruned += 1;
                continue;
            }
            let next_key = next.pegs;
            let next_g = g + 1;
            let improves = best_g.get(&next_key).map_or(true, |&old| next_g < old);
            if !improves {
                continue;
            }
            best_g.insert(next_key, next_g);
            came_from.insert(next_key, (key, mv));
            boards.insert(next_key, next);
            let f = next_g as i64 + heuristic(&next, pdb);
            key_of_entry.insert(counter, next_key);
            open.push(OpenEntry { f, counter });
            counter += 1;
        }
    }

    stats.time_ms = start_time.elapsed().as_millis() as u64;
    SolveOutcome::NoSolution(stats)
}

fn reconstruct(came_from: &HashMap<u64, (u64, Move)>, mut key: u64, start_key: u64) -> Solution {
    let mut moves = Vec::new();
    while key != start_key {
        let Some(&(parent, mv)) = came_from.get(&key) else {
            break;
        };
        moves.push(mv);
        key = parent;
    }
    moves.reverse();
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ENGLISH_VALID_MASK;
    use crate::verify::verify;

    #[test]
    fn solves_the_minimal_two_peg_scenario() {
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let outcome = solve(&board, &EngineOpts::default(), None);
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
        let outcome = solve(&board, &EngineOpts::default(), None);
        assert!(matches!(outcome, SolveOutcome::NoSolution(_)));
    }

    #[test]
    fn solves_a_seven_move_block_and_produces_a_verified_path() {
        // S2: a 3x3 block of pegs within the cross.
        let mut pegs = 0u64;
        for pos in [16u8, 17, 18, 23, 24, 25, 30, 31] {
            pegs |= 1u64 << pos;
        }
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let opts = EngineOpts::default().with_deadline(Deadline::after(std::time::Duration::from_secs(10)));
        let outcome = solve(&board, &opts, None);
        if let SolveOutcome::Solved(moves) = outcome {
            assert!(verify(&board, &moves, None).is_ok());
        } else {
            panic!("expected a solution for the 3x3 block");
        }
    }

    #[test]
    fn heuristic_never_exceeds_peg_count_bound_without_pdb() {
        let board = Board::english_start();
        assert_eq!(heuristic(&board, None), peg_count_bound(&board));
    }
}
