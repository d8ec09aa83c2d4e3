//! Solution store (spec §4.H): on-disk JSON persistence of verified
//! solutions keyed by canonical form, an in-memory waypoint index for
//! resuming mid-solution, and a peg-count secondary index for size-based
//! queries. Grounded in the teacher's atomic write-temp-then-rename
//! pattern, reused here the way [`crate::pdb::PatternDb::save`] uses it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::{Board, ENGLISH_VALID_MASK};
use crate::error::StoreError;
use crate::symmetry::{self, canonical_key, canonical_with_symmetry, permute_move, Symmetry};
use crate::types::{EngineKind, Solution};

const CURRENT_VERSION: u32 = 1;

/// Snapshot every 5th move of a stored solution (spec §4.H example stride).
const WAYPOINT_STRIDE: usize = 5;

/// The provenance of a stored solution: which engine produced it and how
/// long that took, kept alongside the moves for operator diagnostics (spec
/// §6 solution store file shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveMeta {
    pub solver: &'static str,
    pub time_elapsed_ms: u64,
    pub timestamp: u64,
}

impl SolveMeta {
    pub fn new(solver: EngineKind, time_elapsed_ms: u64) -> Self {
        Self {
            solver: solver.name(),
            time_elapsed_ms,
            timestamp: now_secs(),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn default_valid() -> u64 {
    ENGLISH_VALID_MASK
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    moves: Solution,
    move_count: u32,
    #[serde(default)]
    metadata: Option<SolveMeta>,
    /// The `valid` mask of the board this solution was solved against.
    /// Needed to replay the solution for waypoint indexing after a reload,
    /// since an arbitrary (non-English) cut-out's `valid` isn't recoverable
    /// from `moves` alone. Legacy and pre-this-field files default to the
    /// English cross, matching every entry they could have held.
    #[serde(default = "default_valid")]
    valid: u64,
}

impl StoredEntry {
    fn new(moves: Solution, metadata: Option<SolveMeta>, valid: u64) -> Self {
        let move_count = moves.len() as u32;
        Self { moves, move_count, metadata, valid }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    last_updated: u64,
    entries: HashMap<u64, StoredEntry>,
}

/// The pre-versioning on-disk shape: a bare map from key to move list.
type LegacyShape = HashMap<u64, Solution>;

/// A solution reachable from some waypoint state: `prefix` is how the
/// original solve got there, `suffix` is what remains.
#[derive(Debug, Clone)]
struct Waypoint {
    prefix: Solution,
    suffix: Solution,
}

/// The verified-solution cache: every accepted solve result passes through
/// here before a meta-solver reports success, and every meta-solver's first
/// step is a lookup against it (spec §4.G step 1).
pub struct SolutionStore {
    path: PathBuf,
    primary: HashMap<u64, StoredEntry>,
    waypoints: HashMap<u64, Waypoint>,
    by_peg_count: HashMap<u32, Vec<u64>>,
}

impl SolutionStore {
    /// Load `path`, tolerating a missing file (starts empty) or a legacy
    /// bare-map shape (migrated in memory, not yet rewritten to disk).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            path,
            primary: HashMap::new(),
            waypoints: HashMap::new(),
            by_peg_count: HashMap::new(),
        };
        store.load();
        store
    }

    fn load(&mut self) {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return,
        };
        if let Ok(file) = serde_json::from_str::<StoreFile>(&data) {
            self.primary = file.entries;
        } else if let Ok(legacy) = serde_json::from_str::<LegacyShape>(&data) {
            debug!(entries = legacy.len(), "solution store: migrating legacy shape");
            self.primary = legacy
                .into_iter()
                .map(|(key, moves)| (key, StoredEntry::new(moves, None, ENGLISH_VALID_MASK)))
                .collect();
        } else {
            warn!(path = %self.path.display(), "solution store: unreadable, starting empty");
            return;
        }
        self.rebuild_indices();
    }

    fn rebuild_indices(&mut self) {
        self.waypoints.clear();
        self.by_peg_count.clear();
        for (&key, entry) in &self.primary {
            self.by_peg_count.entry(peg_count_of(key)).or_default().push(key);
            index_waypoints(key, entry.valid, &entry.moves, &mut self.waypoints);
        }
    }

    /// Persist the current contents atomically: write to a temp file in the
    /// store's own directory, then rename over the target.
    pub fn save(&self) -> Result<(), StoreError> {
        let file = StoreFile {
            version: CURRENT_VERSION,
            last_updated: now_secs(),
            entries: self.primary.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = tempfile_in(dir)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// An exact or symmetry-congruent hit for `board`, with the stored
    /// moves rewritten back into `board`'s own coordinate frame.
    ///
    /// The store always canonicalises before indexing, so a query board
    /// that is merely a D4 image of a stored start shares that start's key;
    /// the inverse of the transform that canonicalised `board` maps the
    /// stored moves (recorded against the canonical representative) back
    /// onto `board` itself. Arbitrary (non-English) boards canonicalise to
    /// themselves under the identity, since their cut-out need not share
    /// the cross's symmetry.
    pub fn lookup(&self, board: &Board) -> Option<Solution> {
        let (canon_pegs, sym) = canonical_with_symmetry(board);
        let entry = self.primary.get(&canon_pegs)?;
        Some(transform_moves(&entry.moves, sym.inverse()))
    }

    /// A hit for a state that is a waypoint snapshot of some stored
    /// solution rather than one of its starting positions — the remaining
    /// moves from here, transformed back into `board`'s frame.
    pub fn lookup_waypoint(&self, board: &Board) -> Option<Solution> {
        let (canon_pegs, sym) = canonical_with_symmetry(board);
        let waypoint = self.waypoints.get(&canon_pegs)?;
        Some(transform_moves(&waypoint.suffix, sym.inverse()))
    }

    /// Every stored canonical key whose starting position had exactly
    /// `pegs` pegs — the secondary index backing size-based queries.
    pub fn keys_with_peg_count(&self, pegs: u32) -> &[u64] {
        self.by_peg_count
            .get(&pegs)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record `moves` as a solution for `board`. Idempotent: a shorter
    /// solution for an existing key replaces it, a longer or equal one is
    /// discarded and the original kept. Returns whether the store changed.
    pub fn insert(&mut self, board: &Board, moves: &Solution) -> bool {
        self.insert_with_meta(board, moves, None)
    }

    /// [`Self::insert`] with provenance: which engine produced the solution
    /// and how long it took, recorded alongside the moves.
    pub fn insert_with_meta(
        &mut self,
        board: &Board,
        moves: &Solution,
        meta: Option<SolveMeta>,
    ) -> bool {
        let (canon_pegs, sym) = canonical_with_symmetry(board);
        let canon_moves = transform_moves(moves, sym);
        match self.primary.get(&canon_pegs) {
            Some(existing) if existing.moves.len() <= canon_moves.len() => false,
            _ => {
                self.by_peg_count
                    .entry(peg_count_of(canon_pegs))
                    .or_default()
                    .push(canon_pegs);
                index_waypoints(canon_pegs, board.valid, &canon_moves, &mut self.waypoints);
                self.primary
                    .insert(canon_pegs, StoredEntry::new(canon_moves, meta, board.valid));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }
}

fn transform_moves(moves: &[crate::board::Move], sym: Symmetry) -> Solution {
    moves.iter().map(|mv| permute_move(sym, *mv)).collect()
}

fn peg_count_of(pegs: u64) -> u32 {
    pegs.count_ones()
}

/// Replay `moves` from the canonical start `canon_pegs` over board shape
/// `valid` and snapshot every `WAYPOINT_STRIDE`-th intermediate state's own
/// canonical key.
fn index_waypoints(canon_pegs: u64, valid: u64, moves: &Solution, out: &mut HashMap<u64, Waypoint>) {
    let mut board = Board::new_unchecked(canon_pegs, valid);
    for (i, mv) in moves.iter().enumerate() {
        board = board.apply_move(*mv);
        if (i + 1) % WAYPOINT_STRIDE == 0 && i + 1 < moves.len() {
            let key = canonical_key(&board);
            out.entry(key).or_insert_with(|| Waypoint {
                prefix: moves[..=i].to_vec(),
                suffix: moves[i + 1..].to_vec(),
            });
        }
    }
}

fn tempfile_in(dir: &Path) -> std::io::Result<PathBuf> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    Ok(dir.join(format!(".store-{nanos}.tmp")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::symmetry::Symmetry as Sym;
    use tempfile::tempdir;

    fn two_peg_board() -> (Board, Solution) {
        let pegs = (1u64 << 16) | (1u64 << 17);
        let board = Board::new(pegs, ENGLISH_VALID_MASK).unwrap();
        let mv = board.generate_moves()[0];
        (board, vec![mv])
    }

    #[test]
    fn insert_then_lookup_round_trips() {
        let dir = tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let (board, moves) = two_peg_board();
        assert!(store.insert(&board, &moves));
        let found = store.lookup(&board).expect("expected a hit");
        assert_eq!(found, moves);
    }

    #[test]
    fn insert_with_meta_round_trips_provenance() {
        let dir = tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let (board, moves) = two_peg_board();
        let meta = SolveMeta::new(EngineKind::Dfs, 12);
        assert!(store.insert_with_meta(&board, &moves, Some(meta)));
        let (canon_pegs, _) = canonical_with_symmetry(&board);
        let entry = store.primary.get(&canon_pegs).unwrap();
        assert_eq!(entry.metadata.as_ref().unwrap().solver, EngineKind::Dfs.name());
    }

    #[test]
    fn lookup_matches_a_symmetric_image_of_a_stored_start() {
        let dir = tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let (board, moves) = two_peg_board();
        store.insert(&board, &moves);

        let mirrored_pegs = symmetry::permute_mask(Sym::FlipH, board.pegs);
        let mirrored = Board::new_unchecked(mirrored_pegs, ENGLISH_VALID_MASK);
        let found = store.lookup(&mirrored).expect("expected a symmetric hit");

        // Replaying the transformed moves against the mirrored board must
        // itself solve it — the whole point of the inverse-transform step.
        let mut replay = mirrored;
        for mv in &found {
            replay = replay.apply_move(*mv);
        }
        assert_eq!(replay.peg_count(), 1);
    }

    #[test]
    fn lookup_does_not_apply_symmetry_to_an_arbitrary_board() {
        let dir = tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let valid = (1u64 << 10) | (1u64 << 16) | (1u64 << 24);
        let pegs = (1u64 << 10) | (1u64 << 16);
        let board = Board::new(pegs, valid).unwrap();
        let mv = board.generate_moves()[0];
        store.insert(&board, &vec![mv]);

        let (canon_pegs, sym) = canonical_with_symmetry(&board);
        assert_eq!(canon_pegs, board.pegs);
        assert_eq!(sym, Sym::Identity);
        assert_eq!(store.lookup(&board).unwrap(), vec![mv]);
    }

    #[test]
    fn shorter_solution_replaces_a_longer_one() {
        let dir = tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let (board, moves) = two_peg_board();
        let longer = {
            let mut m = moves.clone();
            m.push(moves[0]);
            m
        };
        store.insert(&board, &longer);
        assert_eq!(store.lookup(&board).unwrap().len(), 2);
        store.insert(&board, &moves);
        assert_eq!(store.lookup(&board).unwrap().len(), 1);
    }

    #[test]
    fn longer_solution_does_not_replace_a_shorter_one() {
        let dir = tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let (board, moves) = two_peg_board();
        store.insert(&board, &moves);
        let longer = {
            let mut m = moves.clone();
            m.push(moves[0]);
            m
        };
        assert!(!store.insert(&board, &longer));
        assert_eq!(store.lookup(&board).unwrap().len(), 1);
    }

    #[test]
    fn save_then_open_restores_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solutions.json");
        let (board, moves) = two_peg_board();
        {
            let mut store = SolutionStore::open(&path);
            store.insert(&board, &moves);
            store.save().unwrap();
        }
        let reopened = SolutionStore::open(&path);
        assert_eq!(reopened.len(), 1);
        assert!(reopened.lookup(&board).is_some());
    }

    #[test]
    fn legacy_bare_map_shape_is_migrated_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solutions.json");
        let (board, moves) = two_peg_board();
        let (canon_pegs, _) = canonical_with_symmetry(&board);
        let legacy: LegacyShape = HashMap::from([(canon_pegs, moves.clone())]);
        std::fs::write(&path, serde_json::to_string(&legacy).unwrap()).unwrap();

        let store = SolutionStore::open(&path);
        assert_eq!(store.len(), 1);
        assert!(store.lookup(&board).is_some());
    }

    #[test]
    fn missing_file_opens_empty_without_error() {
        let dir = tempdir().unwrap();
        let store = SolutionStore::open(dir.path().join("does-not-exist.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn peg_count_index_reports_stored_keys() {
        let dir = tempdir().unwrap();
        let mut store = SolutionStore::open(dir.path().join("solutions.json"));
        let (board, moves) = two_peg_board();
        store.insert(&board, &moves);
        assert_eq!(store.keys_with_peg_count(2).len(), 1);
        assert!(store.keys_with_peg_count(3).is_empty());
    }
}
