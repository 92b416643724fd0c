//! Search entry point consumed by the UCI loop.
//!
//! An [`Engine`] owns the shared transposition table, the master's search
//! context and a pool of parked helper threads. Each call to
//! [`Engine::search_detailed`] publishes the position to the helpers, runs
//! the master's iterative deepening on the calling thread, then collects and
//! merges every worker's report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engines::search_limits::{EngineConfig, SearchLimits};
use crate::engines::time_management::decide_time_control;
use crate::game_state::board::Board;
use crate::move_generation::legal_move_generator::generate_moves;
use crate::moves::move_descriptions::Move;
use crate::moves::slider_moves::init_slider_tables;
use crate::search::iterative_deepening::{search_worker, IterationParams, WorkerReport};
use crate::search::search_context::{CutoffStats, SearchContext};
use crate::search::threading::{SearchJob, SharedSearchState, WorkerPool};
use crate::search::transposition_table::{TranspositionTable, TtStats};

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub seldepth: usize,
    pub nodes: u64,
    pub qnodes: u64,
    pub elapsed_ms: u64,
    pub nps: u64,
    pub tt_stats: TtStats,
    pub cutoff_stats: CutoffStats,
    pub hashfull: u32,
}

/// Cloneable handle that stops a running search from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<SharedSearchState>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.shared.request_stop();
    }
}

pub struct Engine {
    config: EngineConfig,
    tt: Arc<TranspositionTable>,
    shared: Arc<SharedSearchState>,
    master: SearchContext,
    pool: WorkerPool,
    fresh: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        init_slider_tables();
        let tt = Arc::new(TranspositionTable::new_with_mb(config.tt_size_mb));
        let shared = SharedSearchState::new();
        let master = SearchContext::new(0, Arc::clone(&tt), Arc::clone(&shared));
        let pool = WorkerPool::new(config.helper_threads());
        log::debug!(
            "engine ready: {} MB table, {} thread(s)",
            config.tt_size_mb,
            pool.helper_count() + 1
        );
        Self {
            config,
            tt,
            shared,
            master,
            pool,
            fresh: true,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.pool.helper_count() + 1
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.config.threads = threads.max(1);
        // Dropping the old pool joins its helpers first.
        self.pool = WorkerPool::new(0);
        self.pool = WorkerPool::new(self.config.helper_threads());
        self.fresh = true;
    }

    pub fn set_hash_size_mb(&mut self, size_mb: usize) {
        self.config.tt_size_mb = size_mb.max(1);
        self.tt = Arc::new(TranspositionTable::new_with_mb(self.config.tt_size_mb));
        self.master.attach(Arc::clone(&self.tt), Arc::clone(&self.shared));
    }

    /// Forget the table and every worker's ordering heuristics.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.master.clear_heuristics();
        self.fresh = true;
    }

    pub fn stop(&self) {
        self.shared.request_stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Best move for the side to move, or `None` when it has no legal move.
    pub fn search(&mut self, board: &Board, limits: &SearchLimits) -> Option<Move> {
        self.search_detailed(board, limits).best_move
    }

    pub fn search_detailed(&mut self, board: &Board, limits: &SearchLimits) -> SearchResult {
        let started = Instant::now();
        let decision = decide_time_control(limits, board.side_to_move());
        let params = IterationParams {
            max_depth: decision.max_depth,
            deadline: decision.time_ms.map(|ms| started + Duration::from_millis(ms)),
            aspiration_window: self.config.aspiration_window,
            max_quiescence_ply: self.config.max_quiescence_ply,
        };

        self.shared.reset_accounting();
        self.shared.set_node_budget(limits.nodes);
        self.tt.new_search();

        let fresh = std::mem::take(&mut self.fresh);
        self.pool.start(Arc::new(SearchJob {
            board: board.clone(),
            params,
            tt: Arc::clone(&self.tt),
            shared: Arc::clone(&self.shared),
            fresh,
        }));

        self.master.attach(Arc::clone(&self.tt), Arc::clone(&self.shared));
        let master = search_worker(&mut self.master, board.clone(), &params);
        self.shared.request_stop();
        let helpers = self.pool.wait();

        let result = self.merge_reports(board, master, &helpers, started);
        log::info!(
            "search done: depth {} score {} nodes {} ({} q) {} ms {} nps hashfull {} tt hit {:.1}% best {}",
            result.depth,
            result.score,
            result.nodes,
            result.qnodes,
            result.elapsed_ms,
            result.nps,
            result.hashfull,
            result.tt_stats.negamax.hit_rate(),
            result
                .best_move
                .map_or_else(|| "(none)".to_owned(), |mv| mv.to_string())
        );
        result
    }

    fn merge_reports(
        &self,
        board: &Board,
        master: WorkerReport,
        helpers: &[WorkerReport],
        started: Instant,
    ) -> SearchResult {
        let mut result = SearchResult {
            best_move: master.best_move,
            score: master.score,
            depth: master.completed_depth,
            seldepth: master.seldepth,
            nodes: master.nodes,
            qnodes: master.qnodes,
            tt_stats: master.tt_stats,
            cutoff_stats: master.cutoffs,
            ..SearchResult::default()
        };

        for report in helpers {
            result.nodes += report.nodes;
            result.qnodes += report.qnodes;
            result.seldepth = result.seldepth.max(report.seldepth);
            result.tt_stats.merge(&report.tt_stats);
            result.cutoff_stats.merge(&report.cutoffs);
        }

        if result.best_move.is_none() {
            if let Some(helper) = helpers
                .iter()
                .filter(|r| r.best_move.is_some())
                .max_by_key(|r| r.completed_depth)
            {
                result.best_move = helper.best_move;
                result.score = helper.score;
                result.depth = helper.completed_depth;
            }
        }
        if result.best_move.is_none() {
            result.best_move = generate_moves(board, false).first().copied();
        }

        result.elapsed_ms = started.elapsed().as_millis() as u64;
        let total = result.nodes + result.qnodes;
        result.nps = total * 1000 / result.elapsed_ms.max(1);
        result.hashfull = self.tt.hashfull();
        result
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.request_stop();
    }
}
