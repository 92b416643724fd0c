//! Shared transposition table of packed 64-bit entries.
//!
//! Clusters of four `AtomicU64` words are read and written with relaxed
//! ordering and no locks. A word is always written whole, and two positions
//! that share a cluster and a 16-bit verification key can still collide, so
//! callers re-validate every returned move against the live board.
//!
//! Entry layout (low to high bits):
//! `score:16 | depth:8 | bound:2 | generation:6 | move:16 | key:16`.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::moves::move_descriptions::PackedMove;
use crate::search::board_scoring::MATE_SCORE;
use crate::search::search_context::MAX_PLY;

pub const CLUSTER_SIZE: usize = 4;

const SCORE_SHIFT: u32 = 0;
const DEPTH_SHIFT: u32 = 16;
const BOUND_SHIFT: u32 = 24;
const GENERATION_SHIFT: u32 = 26;
const MOVE_SHIFT: u32 = 32;
const KEY_SHIFT: u32 = 48;

const SCORE_MASK: u64 = 0xFFFF;
const DEPTH_MASK: u64 = 0xFF;
const BOUND_MASK: u64 = 0x3;
const GENERATION_MASK: u64 = 0x3F;
const MOVE_MASK: u64 = 0xFFFF;
const KEY_MASK: u64 = 0xFFFF;

/// Depth byte reserved for unused slots.
const EMPTY_DEPTH: u8 = 0xFF;
const EMPTY_ENTRY: u64 = (EMPTY_DEPTH as u64) << DEPTH_SHIFT;
pub const MAX_STORED_DEPTH: i32 = EMPTY_DEPTH as i32 - 1;

const GENERATION_CYCLE: u8 = 64;
const HASHFULL_SAMPLE_CLUSTERS: usize = 1000;

/// Scores beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - MAX_PLY as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact = 0,
    Lower = 1,
    Upper = 2,
    /// Produced by a search that was cut short; never trusted on probe.
    Tempered = 3,
}

impl Bound {
    #[inline]
    const fn from_bits(bits: u64) -> Bound {
        match bits & BOUND_MASK {
            0 => Bound::Exact,
            1 => Bound::Lower,
            2 => Bound::Upper,
            _ => Bound::Tempered,
        }
    }

    /// Bound for a finished node, downgraded when any line was cut short.
    pub fn classify(
        score: i32,
        alpha_orig: i32,
        beta: i32,
        best_tempered: bool,
        any_tempered: bool,
    ) -> Bound {
        if best_tempered {
            Bound::Tempered
        } else if score >= beta {
            Bound::Lower
        } else if any_tempered {
            if score > alpha_orig {
                Bound::Lower
            } else {
                Bound::Tempered
            }
        } else if score <= alpha_orig {
            Bound::Upper
        } else {
            Bound::Exact
        }
    }
}

/// Decoded view of one table word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub key: u16,
    pub best_move: PackedMove,
    pub score: i16,
    pub depth: u8,
    pub bound: Bound,
    pub generation: u8,
}

impl TtEntry {
    #[inline]
    pub fn pack(self) -> u64 {
        ((self.score as u16 as u64) & SCORE_MASK) << SCORE_SHIFT
            | (u64::from(self.depth) & DEPTH_MASK) << DEPTH_SHIFT
            | (self.bound as u64 & BOUND_MASK) << BOUND_SHIFT
            | (u64::from(self.generation) & GENERATION_MASK) << GENERATION_SHIFT
            | (u64::from(self.best_move.0) & MOVE_MASK) << MOVE_SHIFT
            | (u64::from(self.key) & KEY_MASK) << KEY_SHIFT
    }

    #[inline]
    pub fn unpack(word: u64) -> TtEntry {
        TtEntry {
            score: ((word >> SCORE_SHIFT) & SCORE_MASK) as u16 as i16,
            depth: ((word >> DEPTH_SHIFT) & DEPTH_MASK) as u8,
            bound: Bound::from_bits(word >> BOUND_SHIFT),
            generation: ((word >> GENERATION_SHIFT) & GENERATION_MASK) as u8,
            best_move: PackedMove(((word >> MOVE_SHIFT) & MOVE_MASK) as u16),
            key: ((word >> KEY_SHIFT) & KEY_MASK) as u16,
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.depth == EMPTY_DEPTH
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Miss,
    /// Key matched but the stored search was shallower than requested.
    Shallow,
    /// Key matched but the entry is tempered.
    Tempered,
    Hit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    /// Ply-adjusted score; meaningful only on `Hit`.
    pub score: i32,
    /// Stored move whenever the key matched, even without a cutoff.
    pub best_move: PackedMove,
}

impl ProbeResult {
    const MISS: ProbeResult = ProbeResult {
        outcome: ProbeOutcome::Miss,
        score: 0,
        best_move: PackedMove::NONE,
    };

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.outcome == ProbeOutcome::Hit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Written to an empty slot.
    Inserted,
    /// Refreshed the entry for the same position.
    Updated,
    /// Evicted another position.
    Overwrote,
    /// Every candidate slot was worth more than the new entry.
    Skipped,
}

/// Counters for one search mode, batched by each worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TtCounters {
    pub probes: u64,
    pub hits: u64,
    pub misses: u64,
    pub shallow: u64,
    pub tempered: u64,
    pub stores: u64,
    pub inserts: u64,
    pub updates: u64,
    pub overwrites: u64,
    pub skipped: u64,
}

impl TtCounters {
    #[inline]
    pub fn record_probe(&mut self, outcome: ProbeOutcome) {
        self.probes += 1;
        match outcome {
            ProbeOutcome::Hit => self.hits += 1,
            ProbeOutcome::Miss => self.misses += 1,
            ProbeOutcome::Shallow => self.shallow += 1,
            ProbeOutcome::Tempered => self.tempered += 1,
        }
    }

    #[inline]
    pub fn record_store(&mut self, outcome: StoreOutcome) {
        self.stores += 1;
        match outcome {
            StoreOutcome::Inserted => self.inserts += 1,
            StoreOutcome::Updated => self.updates += 1,
            StoreOutcome::Overwrote => self.overwrites += 1,
            StoreOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, rhs: &TtCounters) {
        self.probes += rhs.probes;
        self.hits += rhs.hits;
        self.misses += rhs.misses;
        self.shallow += rhs.shallow;
        self.tempered += rhs.tempered;
        self.stores += rhs.stores;
        self.inserts += rhs.inserts;
        self.updates += rhs.updates;
        self.overwrites += rhs.overwrites;
        self.skipped += rhs.skipped;
    }

    /// Hits as a percentage of probes.
    pub fn hit_rate(&self) -> f64 {
        if self.probes == 0 {
            0.0
        } else {
            self.hits as f64 * 100.0 / self.probes as f64
        }
    }
}

/// Table statistics split by the search that issued them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TtStats {
    pub negamax: TtCounters,
    pub quiescence: TtCounters,
}

impl TtStats {
    pub fn merge(&mut self, rhs: &TtStats) {
        self.negamax.merge(&rhs.negamax);
        self.quiescence.merge(&rhs.quiescence);
    }
}

#[derive(Debug)]
#[repr(align(32))]
struct Cluster {
    entries: [AtomicU64; CLUSTER_SIZE],
}

impl Cluster {
    fn empty() -> Self {
        Self {
            entries: std::array::from_fn(|_| AtomicU64::new(EMPTY_ENTRY)),
        }
    }
}

#[derive(Debug)]
pub struct TranspositionTable {
    clusters: Vec<Cluster>,
    generation: AtomicU8,
}

/// Convert a root-relative mate score to node-relative form for storage.
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_THRESHOLD {
        score + ply as i32
    } else if score < -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`].
#[inline]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_THRESHOLD {
        score - ply as i32
    } else if score < -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

#[inline]
fn verification_key(hash: u64) -> u16 {
    (hash >> KEY_SHIFT) as u16
}

impl TranspositionTable {
    pub fn new_with_mb(size_mb: usize) -> Self {
        Self {
            clusters: Self::allocate(size_mb),
            generation: AtomicU8::new(0),
        }
    }

    fn allocate(size_mb: usize) -> Vec<Cluster> {
        let bytes = size_mb.max(1) * 1024 * 1024;
        let count = (bytes / std::mem::size_of::<Cluster>()).max(1);
        (0..count).map(|_| Cluster::empty()).collect()
    }

    /// Reallocate at a new size, dropping every entry.
    pub fn resize(&mut self, size_mb: usize) {
        self.clusters = Self::allocate(size_mb);
        self.generation.store(0, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        for cluster in &self.clusters {
            for entry in &cluster.entries {
                entry.store(EMPTY_ENTRY, Ordering::Relaxed);
            }
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Advance the generation once per search so older entries age out.
    pub fn new_search(&self) {
        let next = (self.generation.load(Ordering::Relaxed) + 1) % GENERATION_CYCLE;
        self.generation.store(next, Ordering::Relaxed);
    }

    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.clusters.len() * CLUSTER_SIZE
    }

    #[inline]
    fn cluster(&self, hash: u64) -> &Cluster {
        &self.clusters[(hash % self.clusters.len() as u64) as usize]
    }

    /// Per-mille of sampled slots holding an entry from this search.
    pub fn hashfull(&self) -> u32 {
        let generation = self.generation();
        let sample = self.clusters.len().min(HASHFULL_SAMPLE_CLUSTERS);
        let used = self.clusters[..sample]
            .iter()
            .flat_map(|cluster| cluster.entries.iter())
            .map(|word| TtEntry::unpack(word.load(Ordering::Relaxed)))
            .filter(|entry| !entry.is_empty() && entry.generation == generation)
            .count();
        (used * 1000 / (sample * CLUSTER_SIZE)) as u32
    }

    /// Look up `hash` for a search of `depth` inside `(alpha, beta)`.
    ///
    /// Lower and upper bounds narrow the window and only produce a hit when
    /// it closes. Tempered entries are always a miss.
    pub fn probe(&self, hash: u64, depth: i32, alpha: i32, beta: i32, ply: usize) -> ProbeResult {
        let key = verification_key(hash);

        for word in &self.cluster(hash).entries {
            let entry = TtEntry::unpack(word.load(Ordering::Relaxed));
            if entry.is_empty() || entry.key != key {
                continue;
            }

            let mut result = ProbeResult {
                best_move: entry.best_move,
                ..ProbeResult::MISS
            };
            if entry.bound == Bound::Tempered {
                result.outcome = ProbeOutcome::Tempered;
                return result;
            }
            if i32::from(entry.depth) < depth {
                result.outcome = ProbeOutcome::Shallow;
                return result;
            }

            let score = score_from_tt(i32::from(entry.score), ply);
            let (mut lo, mut hi) = (alpha, beta);
            match entry.bound {
                Bound::Exact => {
                    result.outcome = ProbeOutcome::Hit;
                    result.score = score;
                    return result;
                }
                Bound::Lower => lo = lo.max(score),
                Bound::Upper => hi = hi.min(score),
                Bound::Tempered => {}
            }
            if lo >= hi {
                result.outcome = ProbeOutcome::Hit;
                result.score = score;
            }
            return result;
        }

        ProbeResult::MISS
    }

    /// Raw entry for `hash`, if present (diagnostics and tests).
    pub fn entry(&self, hash: u64) -> Option<TtEntry> {
        let key = verification_key(hash);
        self.cluster(hash)
            .entries
            .iter()
            .map(|word| TtEntry::unpack(word.load(Ordering::Relaxed)))
            .find(|entry| !entry.is_empty() && entry.key == key)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &self,
        hash: u64,
        depth: i32,
        alpha_orig: i32,
        beta: i32,
        score: i32,
        best_move: PackedMove,
        ply: usize,
        best_tempered: bool,
        any_tempered: bool,
    ) -> StoreOutcome {
        let bound = Bound::classify(score, alpha_orig, beta, best_tempered, any_tempered);
        let generation = self.generation();
        let new_entry = TtEntry {
            key: verification_key(hash),
            best_move,
            score: score_to_tt(score, ply).clamp(-MATE_SCORE, MATE_SCORE) as i16,
            depth: depth.clamp(0, MAX_STORED_DEPTH) as u8,
            bound,
            generation,
        };

        let cluster = self.cluster(hash);
        let mut victim: Option<(usize, TtEntry)> = None;

        for (idx, word) in cluster.entries.iter().enumerate() {
            let existing = TtEntry::unpack(word.load(Ordering::Relaxed));

            if existing.is_empty() {
                word.store(new_entry.pack(), Ordering::Relaxed);
                return StoreOutcome::Inserted;
            }

            if existing.key == new_entry.key {
                let keeps_better = bound == Bound::Tempered && existing.bound != Bound::Tempered;
                if new_entry.depth < existing.depth || keeps_better {
                    return StoreOutcome::Skipped;
                }
                let mut refreshed = new_entry;
                if refreshed.best_move.is_none() {
                    refreshed.best_move = existing.best_move;
                }
                word.store(refreshed.pack(), Ordering::Relaxed);
                return StoreOutcome::Updated;
            }

            let replace = match victim {
                None => true,
                Some((_, current)) => {
                    let age = self.age(&existing);
                    let current_age = self.age(&current);
                    age > current_age || (age == current_age && existing.depth < current.depth)
                }
            };
            if replace {
                victim = Some((idx, existing));
            }
        }

        let Some((idx, old)) = victim else {
            return StoreOutcome::Skipped;
        };
        if self.age(&old) == 0 && old.depth >= new_entry.depth {
            return StoreOutcome::Skipped;
        }
        cluster.entries[idx].store(new_entry.pack(), Ordering::Relaxed);
        StoreOutcome::Overwrote
    }

    #[inline]
    fn age(&self, entry: &TtEntry) -> u8 {
        (self.generation() + GENERATION_CYCLE - entry.generation) % GENERATION_CYCLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::board::Board;
    use crate::move_generation::legal_move_generator::generate_moves;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Hashes that land in the same cluster of `tt` with distinct keys.
    fn same_cluster_hashes(tt: &TranspositionTable, count: usize) -> Vec<u64> {
        let clusters = tt.cluster_count() as u64;
        (1..=count as u64)
            .map(|i| {
                let wanted_key = i << KEY_SHIFT;
                wanted_key - (wanted_key % clusters) + 7
            })
            .collect()
    }

    #[test]
    fn entry_packing_round_trips() {
        let entry = TtEntry {
            key: 0xBEEF,
            best_move: PackedMove::new(12, 28, None),
            score: -1234,
            depth: 17,
            bound: Bound::Upper,
            generation: 63,
        };
        assert_eq!(TtEntry::unpack(entry.pack()), entry);
        assert_eq!(TtEntry::unpack(entry.pack()).pack(), entry.pack());
    }

    #[test]
    fn exact_store_then_probe_returns_score_and_move() {
        let tt = TranspositionTable::new_with_mb(1);
        let hash = 0x1234_5678_9ABC_DEF0;
        let mv = PackedMove::new(6, 21, None);
        let outcome = tt.store(hash, 5, -50, 50, 17, mv, 0, false, false);
        assert_eq!(outcome, StoreOutcome::Inserted);

        let result = tt.probe(hash, 5, -50, 50, 0);
        assert_eq!(result.outcome, ProbeOutcome::Hit);
        assert_eq!(result.score, 17);
        assert_eq!(result.best_move, mv);

        let deeper = tt.probe(hash, 6, -50, 50, 0);
        assert_eq!(deeper.outcome, ProbeOutcome::Shallow);
        assert_eq!(deeper.best_move, mv);
    }

    #[test]
    fn bounds_only_cut_when_the_window_closes() {
        let tt = TranspositionTable::new_with_mb(1);
        let hash = 0x0F0F_0000_1111_2222;
        // Fail-high at 120 against beta 100 stores a lower bound.
        tt.store(hash, 4, 0, 100, 120, PackedMove::new(1, 18, None), 0, false, false);
        assert_eq!(tt.entry(hash).map(|e| e.bound), Some(Bound::Lower));
        assert!(tt.probe(hash, 4, 0, 100, 0).is_hit());
        assert!(!tt.probe(hash, 4, 0, 200, 0).is_hit());
    }

    #[test]
    fn tempered_entries_never_hit() {
        let tt = TranspositionTable::new_with_mb(1);
        let hash = 0xAAAA_0000_0000_0001;
        tt.store(hash, 8, -100, 100, 40, PackedMove::new(12, 20, None), 0, true, true);
        assert_eq!(tt.entry(hash).map(|e| e.bound), Some(Bound::Tempered));
        let result = tt.probe(hash, 1, -30_000, 30_000, 0);
        assert_eq!(result.outcome, ProbeOutcome::Tempered);
        assert_eq!(result.best_move, PackedMove::new(12, 20, None));
    }

    #[test]
    fn tempered_sibling_widens_exact_to_lower_bound() {
        assert_eq!(Bound::classify(30, 0, 100, false, true), Bound::Lower);
        assert_eq!(Bound::classify(-10, 0, 100, false, true), Bound::Tempered);
        assert_eq!(Bound::classify(30, 0, 100, false, false), Bound::Exact);
        assert_eq!(Bound::classify(-10, 0, 100, false, false), Bound::Upper);
    }

    #[test]
    fn mate_scores_are_stored_relative_to_the_node() {
        let tt = TranspositionTable::new_with_mb(1);
        let hash = 0x5555_0000_0000_0042;
        let mate_in_root_plies = MATE_SCORE - 7;
        tt.store(hash, 3, -MATE_SCORE, MATE_SCORE, mate_in_root_plies, PackedMove::NONE, 4, false, false);
        // Same node reached at ply 2 is three plies closer to the root.
        let result = tt.probe(hash, 3, -MATE_SCORE, MATE_SCORE, 2);
        assert_eq!(result.score, MATE_SCORE - 5);
    }

    #[test]
    fn same_key_keeps_the_deeper_entry() {
        let tt = TranspositionTable::new_with_mb(1);
        let hash = 0x7777_0000_0000_0003;
        tt.store(hash, 6, -10, 10, 1, PackedMove::new(1, 2, None), 0, false, false);
        assert_eq!(
            tt.store(hash, 2, -10, 10, 9, PackedMove::new(3, 4, None), 0, false, false),
            StoreOutcome::Skipped
        );
        assert_eq!(tt.entry(hash).map(|e| e.depth), Some(6));
        assert_eq!(
            tt.store(hash, 7, -10, 10, 5, PackedMove::new(3, 4, None), 0, false, false),
            StoreOutcome::Updated
        );
        assert_eq!(tt.entry(hash).map(|e| e.score), Some(5));
    }

    #[test]
    fn full_cluster_evicts_stale_then_shallow_entries() {
        let tt = TranspositionTable::new_with_mb(1);
        let hashes = same_cluster_hashes(&tt, 6);
        for (i, &hash) in hashes.iter().take(4).enumerate() {
            tt.store(hash, 10 + i as i32, -1, 1, 0, PackedMove::NONE, 0, false, false);
        }

        // Everything is from this search and deeper than 3: nothing to evict.
        assert_eq!(
            tt.store(hashes[4], 3, -1, 1, 0, PackedMove::NONE, 0, false, false),
            StoreOutcome::Skipped
        );

        // After a new search the shallowest old entry goes first.
        tt.new_search();
        assert_eq!(
            tt.store(hashes[4], 3, -1, 1, 0, PackedMove::NONE, 0, false, false),
            StoreOutcome::Overwrote
        );
        assert!(tt.entry(hashes[0]).is_none());
        assert!(tt.entry(hashes[4]).is_some());
    }

    #[test]
    fn generation_wraps_after_sixty_four_searches() {
        let tt = TranspositionTable::new_with_mb(1);
        for _ in 0..64 {
            tt.new_search();
        }
        assert_eq!(tt.generation(), 0);
    }

    #[test]
    fn hashfull_counts_current_generation_only() {
        let tt = TranspositionTable::new_with_mb(1);
        assert_eq!(tt.hashfull(), 0);
        for i in 0..4000u64 {
            let hash = i.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            tt.store(hash, 1, -1, 1, 0, PackedMove::NONE, 0, false, false);
        }
        assert!(tt.hashfull() > 0);
        tt.new_search();
        assert_eq!(tt.hashfull(), 0);
        tt.clear();
        assert!(tt.entry(0x9E37_79B9_7F4A_7C15).is_none());
    }

    #[test]
    fn concurrent_store_and_probe_never_yield_an_illegal_move() {
        let tt = TranspositionTable::new_with_mb(4);

        std::thread::scope(|scope| {
            for thread_id in 0..4u64 {
                let tt = &tt;
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(1000 + thread_id);
                    for _ in 0..25 {
                        let mut board = Board::new_game();
                        for _ in 0..40 {
                            let moves = generate_moves(&board, false);
                            if moves.is_empty() {
                                break;
                            }
                            let first = moves[0].pack();
                            tt.store(board.hash(), 2, -50, 50, 0, first, 0, false, false);

                            let result = tt.probe(board.hash(), 0, -50, 50, 0);
                            if result.is_hit() && !result.best_move.is_none() {
                                assert!(
                                    moves.iter().any(|mv| result.best_move.matches(mv)),
                                    "probe returned an illegal move in {}",
                                    board.to_fen()
                                );
                            }

                            let mv = moves[rng.random_range(0..moves.len())];
                            board.make_move(mv);
                        }
                    }
                });
            }
        });
    }

    #[test]
    fn resize_changes_capacity_and_drops_entries() {
        let mut tt = TranspositionTable::new_with_mb(1);
        let small = tt.cluster_count();
        let hash = 0x0F0F_F0F0_1234_5678;
        tt.store(hash, 4, -50, 50, 33, PackedMove::new(1, 18, None), 0, false, false);
        tt.new_search();
        assert!(tt.entry(hash).is_some());

        tt.resize(4);
        assert_eq!(tt.cluster_count(), small * 4);
        assert_eq!(tt.capacity(), tt.cluster_count() * CLUSTER_SIZE);
        assert_eq!(tt.generation(), 0);
        assert!(tt.entry(hash).is_none());
        assert_eq!(tt.probe(hash, 0, -50, 50, 0).outcome, ProbeOutcome::Miss);
    }
}
