//! Iterative deepening driver run by every Lazy SMP worker.
//!
//! The master (thread 0) starts at depth 1; helpers start at `1 + id % 2` so
//! half of them are one iteration ahead, and perturb their root ordering.
//! Only iterations that finish without the stop flag are adopted. When the
//! master finishes it raises the stop flag for everyone else.

use std::time::Instant;

use crate::game_state::board::Board;
use crate::move_generation::legal_move_generator::generate_moves;
use crate::moves::move_descriptions::Move;
use crate::search::aspiration::{search_with_aspiration, DEFAULT_ASPIRATION_WINDOW};
use crate::search::negamax::terminal_score;
use crate::search::quiescence::MAX_QUIESCENCE_PLY;
use crate::search::search_context::{CutoffStats, SearchContext};
use crate::search::transposition_table::{TtStats, MATE_THRESHOLD};

/// Depth ceiling when nothing else limits the search.
pub const INFINITE_DEPTH: i32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationParams {
    pub max_depth: i32,
    pub deadline: Option<Instant>,
    pub aspiration_window: i32,
    pub max_quiescence_ply: usize,
}

impl Default for IterationParams {
    fn default() -> Self {
        Self {
            max_depth: INFINITE_DEPTH,
            deadline: None,
            aspiration_window: DEFAULT_ASPIRATION_WINDOW,
            max_quiescence_ply: MAX_QUIESCENCE_PLY,
        }
    }
}

/// What one worker achieved in one search.
#[derive(Debug, Clone, Default)]
pub struct WorkerReport {
    pub thread_id: usize,
    pub best_move: Option<Move>,
    pub score: i32,
    pub completed_depth: i32,
    pub seldepth: usize,
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_stats: TtStats,
    pub cutoffs: CutoffStats,
}

pub fn search_worker(
    ctx: &mut SearchContext,
    mut board: Board,
    params: &IterationParams,
) -> WorkerReport {
    ctx.begin_search(params.deadline, params.max_quiescence_ply);
    let mut report = WorkerReport {
        thread_id: ctx.thread_id,
        ..WorkerReport::default()
    };

    let root_moves = generate_moves(&board, false);
    if root_moves.is_empty() {
        report.score = terminal_score(board.in_check(), 0);
        return finish(ctx, report);
    }

    // A forced move needs no more than one iteration.
    let max_depth = if root_moves.len() == 1 {
        1
    } else {
        params.max_depth.max(1)
    };
    let first_depth = if ctx.thread_id == 0 {
        1
    } else {
        1 + (ctx.thread_id % 2) as i32
    };
    let mut previous_score = 0;

    for depth in first_depth.min(max_depth)..=max_depth {
        if ctx.stopped() {
            break;
        }
        ctx.root_depth = depth;
        let result = search_with_aspiration(
            &mut board,
            ctx,
            depth,
            previous_score,
            params.aspiration_window,
        );
        if ctx.stopped() {
            break;
        }
        let Some(best_move) = result.best_move else {
            break;
        };

        report.best_move = Some(best_move);
        report.score = result.score;
        report.completed_depth = depth;
        previous_score = result.score;

        if ctx.thread_id == 0 {
            log::debug!(
                "depth {} score {} nodes {} seldepth {} best {}",
                depth,
                result.score,
                ctx.total_nodes(),
                ctx.seldepth,
                best_move
            );
        }

        if result.score.abs() > MATE_THRESHOLD {
            break;
        }
        if params.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
    }

    finish(ctx, report)
}

fn finish(ctx: &mut SearchContext, mut report: WorkerReport) -> WorkerReport {
    ctx.flush_nodes();
    if ctx.thread_id == 0 {
        ctx.shared.request_stop();
    }
    report.seldepth = ctx.seldepth;
    report.nodes = ctx.nodes;
    report.qnodes = ctx.qnodes;
    report.tt_stats = ctx.tt_stats;
    report.cutoffs = ctx.cutoffs;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::search::board_scoring::MATE_SCORE;
    use crate::search::threading::SharedSearchState;
    use crate::search::transposition_table::TranspositionTable;
    use crate::utils::long_algebraic::parse_long_algebraic;
    use std::sync::Arc;
    use std::time::Duration;

    fn run(fen: &str, thread_id: usize, params: IterationParams) -> (Board, WorkerReport) {
        let board = Board::from_fen(fen).expect("FEN should parse");
        let mut ctx = SearchContext::new(
            thread_id,
            Arc::new(TranspositionTable::new_with_mb(4)),
            SharedSearchState::new(),
        );
        let report = search_worker(&mut ctx, board.clone(), &params);
        (board, report)
    }

    fn to_depth(max_depth: i32) -> IterationParams {
        IterationParams {
            max_depth,
            ..IterationParams::default()
        }
    }

    #[test]
    fn stops_early_on_a_mate_score() {
        let (board, report) = run("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 0, to_depth(10));
        let expected = parse_long_algebraic(&board, "a1a8").expect("move should be legal");
        assert_eq!(report.best_move, Some(expected));
        assert_eq!(report.score, MATE_SCORE - 1);
        assert!(report.completed_depth < 10);
    }

    #[test]
    fn completes_every_requested_depth() {
        let (_, report) = run(STARTING_POSITION_FEN, 0, to_depth(4));
        assert_eq!(report.completed_depth, 4);
        assert!(report.best_move.is_some());
        assert!(report.nodes > 0 && report.qnodes > 0);
        assert!(report.tt_stats.negamax.probes > 0);
    }

    #[test]
    fn helper_with_odd_id_skips_depth_one() {
        let (_, report) = run(STARTING_POSITION_FEN, 1, to_depth(2));
        assert_eq!(report.completed_depth, 2);
    }

    #[test]
    fn expired_deadline_adopts_nothing() {
        let params = IterationParams {
            deadline: Some(Instant::now() - Duration::from_millis(5)),
            ..IterationParams::default()
        };
        let (_, report) = run(STARTING_POSITION_FEN, 0, params);
        assert_eq!(report.best_move, None);
        assert_eq!(report.completed_depth, 0);
    }

    #[test]
    fn mated_root_reports_the_mate_score() {
        let (_, report) = run("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1", 0, to_depth(3));
        assert_eq!(report.best_move, None);
        assert_eq!(report.score, -MATE_SCORE);
    }
}
