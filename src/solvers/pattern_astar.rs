//! Pattern-A* (spec §4.F): plain A* with the Pattern Database folded into
//! the heuristic whenever one is available for an English-cross board;
//! falls back to [`super::astar`]'s own `h0` otherwise, so passing `pdb:
//! None` here is exactly equivalent to calling [`super::astar::solve`].

use crate::board::Board;
use crate::pdb::PatternDb;
use crate::types::{EngineOpts, SolveOutcome};

use super::astar;

pub fn solve(board: &Board, opts: &EngineOpts, pdb: Option<&PatternDb>) -> SolveOutcome {
    let pdb = pdb.filter(|_| board.is_english());
    astar::solve(board, opts, pdb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, ENGLISH_VALID_MASK};
    use crate::pdb::PatternDb;
    use crate::types::Deadline;
    use crate::verify::verify;

    #[test]
    fn solves_the_minimal_two_peg_scenario_with_a_pdb() {
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let db = PatternDb::build();
        let outcome = solve(&board, &EngineOpts::default(), Some(&db));
        match outcome {
            SolveOutcome::Solved(moves) => {
                assert_eq!(moves.len(), 1);
                assert!(verify(&board, &moves, None).is_ok());
            }
            _ => panic!("expected a solution"),
        }
    }

    #[test]
    fn ignores_a_pdb_built_for_an_off_cross_board() {
        let valid = (1u64 << 10) | (1u64 << 16) | (1u64 << 24) | (1u64 << 32) | (1u64 << 38);
        let pegs = (1u64 << 10) | (1u64 << 38);
        let board = Board::new(pegs, valid).unwrap();
        let db = PatternDb::build();
        let outcome = solve(&board, &EngineOpts::default(), Some(&db));
        assert!(matches!(outcome, SolveOutcome::NoSolution(_)));
    }

    #[test]
    fn agrees_with_plain_astar_on_a_small_block() {
        let mut pegs = 0u64;
        for pos in [16u8, 17, 18, 23, 24, 25, 30, 31] {
            pegs |= 1u64 << pos;
        }
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let opts = EngineOpts::default()
            .with_deadline(Deadline::after(std::time::Duration::from_secs(10)));
        let db = PatternDb::build();
        let with_pdb = solve(&board, &opts, Some(&db));
        let without_pdb = astar::solve(&board, &opts, None);
        assert_eq!(
            matches!(with_pdb, SolveOutcome::Solved(_)),
            matches!(without_pdb, SolveOutcome::Solved(_)),
        );
    }
}
