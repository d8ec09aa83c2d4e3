//! Error kinds shared across the board engine, solvers, and solution store.

use thiserror::Error;

/// A board or notation input that cannot be turned into a valid [`crate::board::Board`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("peg at cell {0} is not within the board's valid mask")]
    PegOutsideValid(u8),
    #[error("cell index {0} is out of range (must be 0..49)")]
    CellOutOfRange(u32),
    #[error("malformed notation token {0:?}")]
    MalformedToken(String),
    #[error("board size must be 7x7, got {0:?}")]
    UnsupportedSize(String),
    #[error("empty board description")]
    Empty,
}

/// Failure modes a solver can surface. A solver never returns
/// `ValidationFailed` to a caller directly; the meta-solvers that call the
/// verifier escalate it by trying the next engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("no solution found within the configured search bounds")]
    NoSolution,
    /// A solver that exhausted its entire reachable state space (rather than
    /// merely running out of depth/time budget) can assert unsolvability.
    #[error("position is provably unsolvable")]
    ProvenUnsolvable,
    #[error("engine exceeded its deadline")]
    TimedOut,
    #[error("solver produced a move sequence that failed verification")]
    ValidationFailed,
    #[error("invalid board: {0}")]
    InvalidBoard(#[from] BoardError),
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Persistence failures for the solution store. These never abort a solve;
/// callers log and fall back to an empty in-memory store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store file is corrupted or uses an incompatible shape: {0}")]
    Cache(#[from] serde_json::Error),
}
