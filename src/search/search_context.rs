//! Per-worker search state passed by reference through the recursion.
//!
//! Everything here belongs to one thread. Shared data (the table and the
//! stop/node accounting) sits behind the two `Arc`s.

use std::sync::Arc;
use std::time::Instant;

use crate::search::board_scoring::Evaluator;
use crate::search::move_ordering::OrderingHeuristics;
use crate::search::quiescence::MAX_QUIESCENCE_PLY;
use crate::search::threading::SharedSearchState;
use crate::search::transposition_table::{TranspositionTable, TtStats};

pub const MAX_PLY: usize = 128;

/// Local nodes are pushed to the shared counter in batches of this size.
const NODE_FLUSH_INTERVAL: u64 = 1024;

/// Where cutoffs came from, for tuning the ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CutoffStats {
    pub beta_cutoffs: u64,
    pub first_move_cutoffs: u64,
    pub tt_move_cutoffs: u64,
    pub killer_cutoffs: u64,
    pub null_move_cutoffs: u64,
    pub futility_prunes: u64,
    pub lmr_researches: u64,
    pub tt_cutoffs: u64,
}

impl CutoffStats {
    pub fn merge(&mut self, rhs: &CutoffStats) {
        self.beta_cutoffs += rhs.beta_cutoffs;
        self.first_move_cutoffs += rhs.first_move_cutoffs;
        self.tt_move_cutoffs += rhs.tt_move_cutoffs;
        self.killer_cutoffs += rhs.killer_cutoffs;
        self.null_move_cutoffs += rhs.null_move_cutoffs;
        self.futility_prunes += rhs.futility_prunes;
        self.lmr_researches += rhs.lmr_researches;
        self.tt_cutoffs += rhs.tt_cutoffs;
    }

    /// Share of beta cutoffs produced by the first move searched.
    pub fn first_move_rate(&self) -> f64 {
        if self.beta_cutoffs == 0 {
            0.0
        } else {
            self.first_move_cutoffs as f64 * 100.0 / self.beta_cutoffs as f64
        }
    }
}

#[derive(Debug)]
pub struct SearchContext {
    pub thread_id: usize,
    pub tt: Arc<TranspositionTable>,
    pub shared: Arc<SharedSearchState>,
    pub evaluator: Evaluator,
    pub heuristics: OrderingHeuristics,
    pub tt_stats: TtStats,
    pub cutoffs: CutoffStats,
    pub nodes: u64,
    pub qnodes: u64,
    pub seldepth: usize,
    pub root_depth: i32,
    pub deadline: Option<Instant>,
    pub max_quiescence_ply: usize,
    unflushed_nodes: u64,
}

impl SearchContext {
    pub fn new(
        thread_id: usize,
        tt: Arc<TranspositionTable>,
        shared: Arc<SharedSearchState>,
    ) -> Self {
        Self {
            thread_id,
            tt,
            shared,
            evaluator: Evaluator::new(),
            heuristics: OrderingHeuristics::default(),
            tt_stats: TtStats::default(),
            cutoffs: CutoffStats::default(),
            nodes: 0,
            qnodes: 0,
            seldepth: 0,
            root_depth: 0,
            deadline: None,
            max_quiescence_ply: MAX_QUIESCENCE_PLY,
            unflushed_nodes: 0,
        }
    }

    /// Point the context at a (possibly new) table and shared state.
    pub fn attach(&mut self, tt: Arc<TranspositionTable>, shared: Arc<SharedSearchState>) {
        self.tt = tt;
        self.shared = shared;
    }

    /// Reset counters and age the ordering tables before a new search.
    pub fn begin_search(&mut self, deadline: Option<Instant>, max_quiescence_ply: usize) {
        self.deadline = deadline;
        self.max_quiescence_ply = max_quiescence_ply;
        self.nodes = 0;
        self.qnodes = 0;
        self.seldepth = 0;
        self.root_depth = 0;
        self.unflushed_nodes = 0;
        self.tt_stats = TtStats::default();
        self.cutoffs = CutoffStats::default();
        self.heuristics.age();
    }

    /// Drop everything learned so far (new game).
    pub fn clear_heuristics(&mut self) {
        self.heuristics.clear();
        self.evaluator.clear();
    }

    #[inline]
    pub fn count_node(&mut self, quiescence: bool) {
        if quiescence {
            self.qnodes += 1;
        } else {
            self.nodes += 1;
        }
        self.unflushed_nodes += 1;
        if self.unflushed_nodes >= NODE_FLUSH_INTERVAL {
            self.flush_nodes();
        }
    }

    /// Push batched nodes to the shared counter; stops everyone once the
    /// node budget is spent.
    pub fn flush_nodes(&mut self) {
        if self.unflushed_nodes == 0 {
            return;
        }
        if self.shared.bump_nodes_and_check_budget(self.unflushed_nodes) {
            self.shared.request_stop();
        }
        self.unflushed_nodes = 0;
    }

    /// Polled at every node: external stop, node budget or wall clock.
    #[inline]
    pub fn should_stop(&self) -> bool {
        if self.shared.should_stop() {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.shared.request_stop();
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn stopped(&self) -> bool {
        self.shared.should_stop()
    }

    #[inline]
    pub fn total_nodes(&self) -> u64 {
        self.nodes + self.qnodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn context() -> SearchContext {
        SearchContext::new(
            0,
            Arc::new(TranspositionTable::new_with_mb(1)),
            SharedSearchState::new(),
        )
    }

    #[test]
    fn node_budget_sets_the_shared_stop_flag() {
        let mut ctx = context();
        ctx.shared.reset_accounting();
        ctx.shared.set_node_budget(Some(2048));
        for _ in 0..2047 {
            ctx.count_node(false);
        }
        assert!(!ctx.stopped());
        ctx.count_node(true);
        ctx.flush_nodes();
        assert!(ctx.stopped());
        assert_eq!(ctx.total_nodes(), 2048);
        assert_eq!(ctx.qnodes, 1);
    }

    #[test]
    fn expired_deadline_stops_the_search() {
        let mut ctx = context();
        ctx.begin_search(Some(Instant::now() - Duration::from_millis(1)), 8);
        assert!(ctx.should_stop());
        assert!(ctx.shared.should_stop());
    }

    #[test]
    fn cutoff_stats_merge_and_rate() {
        let mut a = CutoffStats {
            beta_cutoffs: 10,
            first_move_cutoffs: 9,
            ..CutoffStats::default()
        };
        let b = CutoffStats {
            beta_cutoffs: 10,
            first_move_cutoffs: 7,
            null_move_cutoffs: 3,
            ..CutoffStats::default()
        };
        a.merge(&b);
        assert_eq!(a.null_move_cutoffs, 3);
        assert!((a.first_move_rate() - 80.0).abs() < 1e-9);
    }
}
