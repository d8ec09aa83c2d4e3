//! Shared result and configuration types used across every solver and
//! meta-solver: a [`Solution`] is just the move sequence the spec defines it
//! as, [`SolverStats`] is the one stats record every engine reports against,
//! and [`EngineOpts`]/[`Deadline`] carry the time budget a long-running
//! engine checks rather than a bare duration (see the Design Notes' "pass a
//! monotonic deadline, not a duration" guidance).

use std::time::{Duration, Instant};

use crate::board::Move;

/// An ordered sequence of moves that reduces a board to exactly one peg.
pub type Solution = Vec<Move>;

/// Per-engine statistics, identical in shape across every solver so callers
/// can compare DFS, A*, Beam, etc. on equal footing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolverStats {
    pub visited: u64,
    pub pruned: u64,
    pub max_depth: u32,
    pub time_ms: u64,
    pub solution_len: Option<u32>,
}

impl SolverStats {
    pub fn record_solution(&mut self, len: usize) {
        self.solution_len = Some(len as u32);
    }
}

/// A monotonic point in time after which a search must stop. Carried through
/// every recursive call and expansion loop instead of a `Duration`, so a
/// chain of callers (Sequential trying engine after engine) shares one
/// absolute clock rather than re-deriving "time left" at each hop.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(duration: Duration) -> Self {
        Self(Instant::now() + duration)
    }

    /// A deadline that has already passed — useful for "no budget left".
    pub fn elapsed() -> Self {
        Self(Instant::now() - Duration::from_secs(1))
    }

    /// A deadline far enough in the future it will not realistically fire.
    pub fn far_future() -> Self {
        Self(Instant::now() + Duration::from_secs(3600 * 24 * 365))
    }

    #[inline]
    pub fn is_past(&self) -> bool {
        Instant::now() >= self.0
    }

    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn instant(&self) -> Instant {
        self.0
    }
}

/// Configuration shared by every engine: a deadline and the handful of
/// per-engine knobs (beam width, max depth) that only some engines consult.
#[derive(Debug, Clone, Copy)]
pub struct EngineOpts {
    pub deadline: Deadline,
    pub beam_width: usize,
    pub max_depth: u32,
    pub target: Option<u8>,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            deadline: Deadline::far_future(),
            beam_width: 200,
            max_depth: 1000,
            target: None,
        }
    }
}

impl EngineOpts {
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_beam_width(mut self, width: usize) -> Self {
        self.beam_width = width;
        self
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_target(mut self, target: u8) -> Self {
        self.target = Some(target);
        self
    }
}

/// The identity of a solver or meta-solver, shared by the progress channel,
/// the Sequential escalation order, and the Governor's dispatch decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EngineKind {
    Lookup,
    Dfs,
    ZobristDfs,
    AStar,
    IdaStar,
    Beam,
    Bidirectional,
    PatternAStar,
    ParallelDfs,
    ParallelBeam,
    Exhaustive,
    BruteForce,
    Governor,
    Sequential,
}

impl EngineKind {
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Lookup => "lookup",
            EngineKind::Dfs => "dfs",
            EngineKind::ZobristDfs => "zobrist-dfs",
            EngineKind::AStar => "a-star",
            EngineKind::IdaStar => "ida-star",
            EngineKind::Beam => "beam",
            EngineKind::Bidirectional => "bidirectional",
            EngineKind::PatternAStar => "pattern-a-star",
            EngineKind::ParallelDfs => "parallel-dfs",
            EngineKind::ParallelBeam => "parallel-beam",
            EngineKind::Exhaustive => "exhaustive",
            EngineKind::BruteForce => "brute-force",
            EngineKind::Governor => "governor",
            EngineKind::Sequential => "sequential",
        }
    }
}

/// Either a verified solution or a diagnostic describing why none was
/// produced — a solver never hands back an unverified sequence (see
/// [`crate::verify`]).
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Solved(Solution),
    NoSolution(SolverStats),
    TimedOut(SolverStats),
}
