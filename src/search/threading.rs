//! Lazy SMP plumbing: shared stop/node accounting and a persistent pool of
//! helper threads.
//!
//! Helpers park on `cv_start` between searches. [`WorkerPool::start`]
//! publishes a job and bumps the job id; each helper copies the job, runs its
//! own iterative deepening on a private board and checks in on `cv_done`.
//! The calling thread acts as the master (thread 0) and is not part of the
//! pool.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Condvar, Mutex, MutexGuard,
};
use std::thread::JoinHandle;

use crate::game_state::board::Board;
use crate::search::iterative_deepening::{search_worker, IterationParams, WorkerReport};
use crate::search::search_context::SearchContext;
use crate::search::transposition_table::TranspositionTable;

/// Cancellation and node accounting shared by every worker of one search.
#[derive(Debug)]
pub struct SharedSearchState {
    stop: AtomicBool,
    pub nodes_visited: AtomicU64,
    node_budget: AtomicU64, // 0 means unlimited
}

impl SharedSearchState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stop: AtomicBool::new(false),
            nodes_visited: AtomicU64::new(0),
            node_budget: AtomicU64::new(0),
        })
    }

    #[inline]
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_node_budget(&self, budget: Option<u64>) {
        self.node_budget.store(budget.unwrap_or(0), Ordering::Relaxed);
    }

    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes_visited.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset_accounting(&self) {
        self.nodes_visited.store(0, Ordering::Relaxed);
        self.stop.store(false, Ordering::Relaxed);
    }

    /// Adds node count and returns true once the node budget is used up.
    #[inline]
    pub fn bump_nodes_and_check_budget(&self, n: u64) -> bool {
        let new_nodes = self.nodes_visited.fetch_add(n, Ordering::Relaxed) + n;
        let limit = self.node_budget.load(Ordering::Relaxed);
        limit != 0 && new_nodes >= limit
    }
}

/// Everything a helper needs to run one search.
#[derive(Debug)]
pub struct SearchJob {
    pub board: Board,
    pub params: IterationParams,
    pub tt: Arc<TranspositionTable>,
    pub shared: Arc<SharedSearchState>,
    /// Clear killers, history and the pawn cache before searching.
    pub fresh: bool,
}

#[derive(Debug, Default)]
struct PoolState {
    job_id: u64,
    job: Option<Arc<SearchJob>>,
    active_workers: usize,
    terminate: bool,
    reports: Vec<WorkerReport>,
}

#[derive(Debug, Default)]
struct PoolShared {
    state: Mutex<PoolState>,
    cv_start: Condvar,
    cv_done: Condvar,
}

impl PoolShared {
    /// A panicking worker must not wedge the engine, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `helpers` parked threads; ids start at 1.
    pub fn new(helpers: usize) -> Self {
        let shared = Arc::new(PoolShared::default());
        let mut handles = Vec::with_capacity(helpers);

        for thread_id in 1..=helpers {
            let pool = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name(format!("bramble-helper-{thread_id}"))
                .spawn(move || helper_loop(thread_id, &pool));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    log::warn!("could not spawn search helper {thread_id}: {err}");
                    break;
                }
            }
        }

        Self { shared, handles }
    }

    #[inline]
    pub fn helper_count(&self) -> usize {
        self.handles.len()
    }

    /// Publish `job` and wake every helper.
    pub fn start(&self, job: Arc<SearchJob>) {
        if self.handles.is_empty() {
            return;
        }
        let mut state = self.shared.lock();
        state.job_id += 1;
        state.job = Some(job);
        state.active_workers = self.handles.len();
        state.reports.clear();
        self.shared.cv_start.notify_all();
    }

    /// Block until every helper has finished the current job.
    pub fn wait(&self) -> Vec<WorkerReport> {
        let mut state = self.shared.lock();
        while state.active_workers > 0 {
            state = self
                .shared
                .cv_done
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        state.job = None;
        std::mem::take(&mut state.reports)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.terminate = true;
            self.shared.cv_start.notify_all();
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::warn!("search helper panicked before shutdown");
            }
        }
    }
}

fn helper_loop(thread_id: usize, pool: &PoolShared) {
    let mut seen_job = 0u64;
    let mut context: Option<SearchContext> = None;

    loop {
        let job = {
            let mut state = pool.lock();
            while !state.terminate && state.job_id == seen_job {
                state = pool
                    .cv_start
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
            if state.terminate {
                return;
            }
            seen_job = state.job_id;
            state.job.clone()
        };

        let report = job.map(|job| {
            let ctx = context.get_or_insert_with(|| {
                SearchContext::new(thread_id, Arc::clone(&job.tt), Arc::clone(&job.shared))
            });
            ctx.attach(Arc::clone(&job.tt), Arc::clone(&job.shared));
            if job.fresh {
                ctx.clear_heuristics();
            }
            search_worker(ctx, job.board.clone(), &job.params)
        });

        let mut state = pool.lock();
        if let Some(report) = report {
            state.reports.push(report);
        }
        state.active_workers = state.active_workers.saturating_sub(1);
        if state.active_workers == 0 {
            pool.cv_done.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn shared_state_stop_and_node_accounting() {
        let state = SharedSearchState::new();
        assert!(!state.should_stop());
        state.request_stop();
        assert!(state.should_stop());

        state.reset_accounting();
        assert!(!state.should_stop());
        assert!(!state.bump_nodes_and_check_budget(10));
        assert_eq!(state.nodes(), 10);
    }

    #[test]
    fn shared_state_budget_checks_work() {
        let state = SharedSearchState::new();
        state.reset_accounting();
        state.set_node_budget(Some(5));
        assert!(!state.bump_nodes_and_check_budget(4));
        assert!(state.bump_nodes_and_check_budget(1));
    }

    #[test]
    fn helpers_run_every_published_job_and_shut_down() {
        let pool = WorkerPool::new(3);
        assert_eq!(pool.helper_count(), 3);
        let tt = Arc::new(TranspositionTable::new_with_mb(1));

        for _ in 0..2 {
            let shared = SharedSearchState::new();
            let job = Arc::new(SearchJob {
                board: Board::new_game(),
                params: IterationParams {
                    max_depth: 2,
                    deadline: Some(Instant::now() + Duration::from_secs(30)),
                    ..IterationParams::default()
                },
                tt: Arc::clone(&tt),
                shared: Arc::clone(&shared),
                fresh: true,
            });
            pool.start(job);
            let reports = pool.wait();
            assert_eq!(reports.len(), 3);
            let mut ids: Vec<usize> = reports.iter().map(|r| r.thread_id).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2, 3]);
            assert!(reports.iter().all(|r| r.best_move.is_some()));
            assert!(shared.nodes() > 0);
        }
        drop(pool);
    }

    #[test]
    fn empty_pool_returns_immediately() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.helper_count(), 0);
        assert!(pool.wait().is_empty());
    }
}
