//! Capture search at the horizon.
//!
//! Out of check only captures and promotions are tried, from a stand-pat
//! floor. In check every evasion is searched and there is no stand pat.

use crate::game_state::board::Board;
use crate::game_state::chess_rules::piece_value;
use crate::game_state::make_move::MoveGuard;
use crate::move_generation::legal_move_generator::generate_moves;
use crate::moves::move_descriptions::{Move, PackedMove};
use crate::search::board_scoring::EvalTerms;
use crate::search::move_ordering::MovePicker;
use crate::search::negamax::{terminal_score, NodeResult, SCORE_INFINITY};
use crate::search::search_context::{SearchContext, MAX_PLY};

pub const MAX_QUIESCENCE_PLY: usize = 32;
pub const DELTA_MARGIN: i32 = 200;

pub fn quiescence(
    board: &mut Board,
    ctx: &mut SearchContext,
    mut alpha: i32,
    beta: i32,
    ply: usize,
    qply: usize,
) -> NodeResult {
    ctx.count_node(true);
    if ctx.should_stop() {
        return NodeResult::ABORTED;
    }
    ctx.seldepth = ctx.seldepth.max(ply);

    if qply >= ctx.max_quiescence_ply || ply >= MAX_PLY - 1 {
        return NodeResult::clean(ctx.evaluator.evaluate_relative(board, EvalTerms::ALL));
    }

    let hash = board.hash();
    let probe = ctx.tt.probe(hash, 0, alpha, beta, ply);
    ctx.tt_stats.quiescence.record_probe(probe.outcome);
    if probe.is_hit() {
        return NodeResult::clean(probe.score);
    }
    let tt_move = board.move_from_packed(probe.best_move);

    let alpha_orig = alpha;
    let in_check = board.in_check();
    let stand_pat = if in_check {
        None
    } else {
        Some(ctx.evaluator.evaluate_relative(board, EvalTerms::ALL))
    };

    if let Some(stand_pat) = stand_pat {
        if stand_pat >= beta {
            let outcome = ctx.tt.store(
                hash,
                0,
                alpha_orig,
                beta,
                stand_pat,
                PackedMove::NONE,
                ply,
                false,
                false,
            );
            ctx.tt_stats.quiescence.record_store(outcome);
            return NodeResult::clean(stand_pat);
        }
        alpha = alpha.max(stand_pat);
    }

    let moves = generate_moves(board, !in_check);
    if in_check && moves.is_empty() {
        return NodeResult::clean(terminal_score(true, ply));
    }

    let mut best_score = stand_pat.unwrap_or(-SCORE_INFINITY);
    let mut best_move: Option<Move> = None;
    let mut best_tempered = false;
    let mut any_tempered = false;

    let picker = MovePicker::new(board, &moves, tt_move.as_ref(), &[None; 2], &ctx.heuristics);
    for scored in picker {
        let mv = scored.mv;

        if let Some(stand_pat) = stand_pat {
            if scored.see < 0 {
                continue;
            }
            if !mv.is_promotion() {
                let gain = mv.captured_piece.map_or(0, piece_value);
                if stand_pat + gain + DELTA_MARGIN < alpha {
                    continue;
                }
            }
        }

        let child = {
            let mut guard = MoveGuard::new(board, mv);
            quiescence(&mut guard, ctx, -beta, -alpha, ply + 1, qply + 1)
        };
        if ctx.stopped() {
            return NodeResult::ABORTED;
        }

        let score = -child.score;
        any_tempered |= child.tempered;
        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            best_tempered = child.tempered;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break;
        }
    }

    let outcome = ctx.tt.store(
        hash,
        0,
        alpha_orig,
        beta,
        best_score,
        best_move.map_or(PackedMove::NONE, |mv| mv.pack()),
        ply,
        best_tempered,
        any_tempered,
    );
    ctx.tt_stats.quiescence.record_store(outcome);

    NodeResult {
        score: best_score,
        best_move,
        tempered: any_tempered,
    }
}
