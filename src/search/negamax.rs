//! Principal variation search over the make/undo board.
//!
//! Every node returns a [`NodeResult`]. A result is *tempered* when it depends
//! on something outside the subtree (the clock ran out, or a repetition of a
//! position from the path); tempered results are OR'd upward and never stored
//! as exact.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game_state::board::Board;
use crate::game_state::make_move::{MoveGuard, NullMoveGuard};
use crate::move_generation::legal_move_generator::generate_moves;
use crate::moves::move_descriptions::{Move, PackedMove};
use crate::search::board_scoring::{EvalTerms, MATE_SCORE};
use crate::search::move_ordering::MovePicker;
use crate::search::quiescence::quiescence;
use crate::search::search_context::{SearchContext, MAX_PLY};
use crate::search::transposition_table::{ProbeOutcome, MATE_THRESHOLD};

/// Strictly outside every reachable score, mate included.
pub const SCORE_INFINITY: i32 = MATE_SCORE + 1;

const NULL_MOVE_MIN_DEPTH: i32 = 3;
const NULL_MOVE_REDUCTION: i32 = 3;
const FUTILITY_MAX_DEPTH: i32 = 2;
const FUTILITY_MARGINS: [i32; 3] = [0, 200, 400];
const LMR_MIN_DEPTH: i32 = 3;
const LMR_MIN_MOVES_SEARCHED: usize = 3;
const LMR_REDUCTION: i32 = 2;
const CHECK_EXTENSION_MAX_PLY: usize = 64;
const CHECK_EXTENSION_MAX_DEPTH: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeResult {
    pub score: i32,
    pub best_move: Option<Move>,
    pub tempered: bool,
}

impl NodeResult {
    pub const ABORTED: NodeResult = NodeResult {
        score: 0,
        best_move: None,
        tempered: true,
    };

    #[inline]
    pub const fn clean(score: i32) -> Self {
        Self {
            score,
            best_move: None,
            tempered: false,
        }
    }
}

/// Score of the side to move when it has no legal moves.
#[inline]
pub fn terminal_score(in_check: bool, ply: usize) -> i32 {
    if in_check {
        -MATE_SCORE + ply as i32
    } else {
        0
    }
}

pub fn negamax(
    board: &mut Board,
    ctx: &mut SearchContext,
    depth: i32,
    alpha: i32,
    beta: i32,
    ply: usize,
) -> NodeResult {
    search_node(board, ctx, depth, alpha, beta, ply, true)
}

fn search_node(
    board: &mut Board,
    ctx: &mut SearchContext,
    depth: i32,
    mut alpha: i32,
    beta: i32,
    ply: usize,
    null_allowed: bool,
) -> NodeResult {
    ctx.count_node(false);
    if ctx.should_stop() {
        return NodeResult::ABORTED;
    }
    ctx.seldepth = ctx.seldepth.max(ply);

    if ply > 0 {
        if board.is_fifty_move_rule_draw() || board.is_repetition_draw(3) {
            return NodeResult::clean(0);
        }
        // A second occurrence scores as a draw only because of the path.
        if board.is_repetition_draw(2) {
            return NodeResult {
                tempered: true,
                ..NodeResult::clean(0)
            };
        }
    }
    if ply >= MAX_PLY - 1 {
        return NodeResult::clean(ctx.evaluator.evaluate_relative(board, EvalTerms::ALL));
    }

    if depth <= 0 {
        return quiescence(board, ctx, alpha, beta, ply, 0);
    }

    let hash = board.hash();
    let alpha_orig = alpha;
    let probe = ctx.tt.probe(hash, depth, alpha, beta, ply);
    ctx.tt_stats.negamax.record_probe(probe.outcome);
    let mut tt_move = board.move_from_packed(probe.best_move);
    let tt_hit = probe.outcome == ProbeOutcome::Hit;

    if tt_hit && ply > 0 {
        if let Some(result) = accept_tt_hit(board, probe.score, probe.best_move, tt_move, ply) {
            ctx.cutoffs.tt_cutoffs += 1;
            return result;
        }
    }

    let moves = generate_moves(board, false);
    if ctx.should_stop() {
        return NodeResult::ABORTED;
    }

    if ply == 0 {
        // A colliding entry can point at a pseudo-legal but illegal move.
        tt_move = tt_move.and_then(|mv| moves.iter().copied().find(|m| *m == mv));
        if tt_hit {
            if let Some(result) = accept_tt_hit(board, probe.score, probe.best_move, tt_move, ply) {
                ctx.cutoffs.tt_cutoffs += 1;
                return result;
            }
        }
    }

    let in_check = board.in_check();

    if moves.is_empty() {
        return NodeResult::clean(terminal_score(in_check, ply));
    }
    if ply == 0 && moves.len() == 1 {
        return NodeResult {
            best_move: Some(moves[0]),
            ..NodeResult::clean(0)
        };
    }

    if null_allowed
        && ply > 0
        && !in_check
        && depth >= NULL_MOVE_MIN_DEPTH
        && beta.abs() < MATE_THRESHOLD
        && board.has_enough_material_for_nmp()
    {
        let child = {
            let mut guard = NullMoveGuard::new(board);
            search_node(
                &mut guard,
                ctx,
                depth - NULL_MOVE_REDUCTION,
                -beta,
                -beta + 1,
                ply + 1,
                false,
            )
        };
        if ctx.stopped() {
            return NodeResult::ABORTED;
        }
        if !child.tempered && -child.score >= beta {
            ctx.cutoffs.null_move_cutoffs += 1;
            return NodeResult::clean(beta);
        }
    }

    let futility_base = if depth <= FUTILITY_MAX_DEPTH
        && ply > 0
        && !in_check
        && alpha.abs() < MATE_THRESHOLD
    {
        let static_eval = ctx.evaluator.evaluate_relative(board, EvalTerms::FAST);
        let base = static_eval + FUTILITY_MARGINS[depth as usize];
        (base <= alpha).then_some(base)
    } else {
        None
    };

    let killers = ctx.heuristics.killers_at(ply);
    let mut picker = MovePicker::new(board, &moves, tt_move.as_ref(), &killers, &ctx.heuristics);
    if ply == 0 && ctx.thread_id != 0 {
        let seed = hash
            ^ (ctx.thread_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (depth as u64).rotate_left(32);
        picker.perturb(&mut StdRng::seed_from_u64(seed));
    }

    let us = board.side_to_move();
    let mut best_score = -SCORE_INFINITY;
    let mut best_move: Option<Move> = None;
    let mut best_tempered = false;
    let mut any_tempered = false;
    let mut moves_searched = 0usize;

    for scored in picker {
        let mv = scored.mv;
        let quiet = mv.is_quiet();
        let is_killer = killers.iter().flatten().any(|k| *k == mv);

        let mut guard = MoveGuard::new(board, mv);
        let gives_check = guard.in_check();

        if let Some(base) = futility_base {
            if quiet && !gives_check {
                ctx.cutoffs.futility_prunes += 1;
                best_score = best_score.max(base);
                continue;
            }
        }

        let extension = i32::from(
            gives_check && ply < CHECK_EXTENSION_MAX_PLY && depth <= CHECK_EXTENSION_MAX_DEPTH,
        );
        let new_depth = depth - 1 + extension;
        let reduction = if quiet
            && !is_killer
            && !in_check
            && !gives_check
            && depth >= LMR_MIN_DEPTH
            && moves_searched > LMR_MIN_MOVES_SEARCHED
        {
            LMR_REDUCTION
        } else {
            0
        };

        let child = if moves_searched == 0 {
            search_node(&mut guard, ctx, new_depth, -beta, -alpha, ply + 1, true)
        } else {
            let reduced = new_depth - reduction;
            let mut child =
                search_node(&mut guard, ctx, reduced, -alpha - 1, -alpha, ply + 1, true);
            if reduction > 0 && -child.score > alpha && !ctx.stopped() {
                ctx.cutoffs.lmr_researches += 1;
                child = search_node(&mut guard, ctx, new_depth, -alpha - 1, -alpha, ply + 1, true);
            }
            if -child.score > alpha && -child.score < beta && !ctx.stopped() {
                child = search_node(&mut guard, ctx, new_depth, -beta, -alpha, ply + 1, true);
            }
            child
        };
        drop(guard);
        moves_searched += 1;

        if ctx.stopped() {
            return NodeResult::ABORTED;
        }

        let score = -child.score;
        any_tempered |= child.tempered;
        if score > best_score || (best_move.is_none() && score == best_score) {
            best_score = score;
            best_move = Some(mv);
            best_tempered = child.tempered;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            ctx.cutoffs.beta_cutoffs += 1;
            if moves_searched == 1 {
                ctx.cutoffs.first_move_cutoffs += 1;
            }
            if tt_move == Some(mv) {
                ctx.cutoffs.tt_move_cutoffs += 1;
            } else if is_killer {
                ctx.cutoffs.killer_cutoffs += 1;
            }
            if quiet {
                ctx.heuristics.record_killer(ply, mv);
                ctx.heuristics.record_history(us, &mv, depth);
            }
            break;
        }
    }

    let stored_move = best_move.map_or(PackedMove::NONE, |mv| mv.pack());
    let outcome = ctx.tt.store(
        hash,
        depth,
        alpha_orig,
        beta,
        best_score,
        stored_move,
        ply,
        best_tempered,
        any_tempered,
    );
    ctx.tt_stats.negamax.record_store(outcome);

    NodeResult {
        score: best_score,
        best_move,
        tempered: any_tempered,
    }
}

/// Use a table cutoff unless its move walks into a repeated position.
///
/// At the root the hit must carry a legal move, since the caller needs one.
fn accept_tt_hit(
    board: &mut Board,
    score: i32,
    packed: PackedMove,
    tt_move: Option<Move>,
    ply: usize,
) -> Option<NodeResult> {
    if packed.is_none() {
        return (ply > 0).then_some(NodeResult::clean(score));
    }
    let mv = tt_move?;
    if leads_to_repetition(board, mv) {
        return None;
    }
    Some(NodeResult {
        best_move: Some(mv),
        ..NodeResult::clean(score)
    })
}

/// Play `mv` and check whether the resulting position has been seen before.
pub fn leads_to_repetition(board: &mut Board, mv: Move) -> bool {
    let guard = MoveGuard::new(board, mv);
    guard.is_repetition_draw(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::threading::SharedSearchState;
    use crate::search::transposition_table::TranspositionTable;
    use crate::utils::long_algebraic::parse_long_algebraic;
    use std::sync::Arc;

    fn context() -> SearchContext {
        SearchContext::new(
            0,
            Arc::new(TranspositionTable::new_with_mb(4)),
            SharedSearchState::new(),
        )
    }

    fn root_search(fen: &str, depth: i32) -> (Board, NodeResult) {
        let mut board = Board::from_fen(fen).expect("FEN should parse");
        let mut ctx = context();
        ctx.begin_search(None, 32);
        let result = negamax(
            &mut board,
            &mut ctx,
            depth,
            -SCORE_INFINITY,
            SCORE_INFINITY,
            0,
        );
        (board, result)
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let (board, result) = root_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 3);
        let expected = parse_long_algebraic(&board, "a1a8").expect("move should be legal");
        assert_eq!(result.best_move, Some(expected));
        assert_eq!(result.score, MATE_SCORE - 1);
        assert!(!result.tempered);
    }

    #[test]
    fn checkmated_and_stalemated_roots_have_no_move() {
        let (_, mated) = root_search("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1", 2);
        assert_eq!(mated.best_move, None);
        assert_eq!(mated.score, -MATE_SCORE);

        let (_, stalemate) = root_search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 2);
        assert_eq!(stalemate.best_move, None);
        assert_eq!(stalemate.score, 0);
    }

    #[test]
    fn single_legal_move_is_returned_without_search() {
        let (board, result) = root_search("7k/5Q2/6K1/8/8/p7/8/8 b - - 0 1", 6);
        assert_eq!(generate_moves(&board, false).len(), 1);
        assert_eq!(result.best_move, generate_moves(&board, false).first().copied());
        assert_eq!(result.score, 0);
    }

    #[test]
    fn wins_the_hanging_queen() {
        let (board, result) = root_search("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", 2);
        let expected = parse_long_algebraic(&board, "d2d5").expect("move should be legal");
        assert_eq!(result.best_move, Some(expected));
        assert!(result.score > 300);
    }

    #[test]
    fn search_leaves_the_board_untouched() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let before = Board::from_fen(fen).expect("FEN should parse");
        let (after, result) = root_search(fen, 3);
        assert!(result.best_move.is_some());
        assert!(after.same_position(&before));
        assert_eq!(after.hash(), after.recompute_hash());
    }

    #[test]
    fn stop_flag_aborts_with_a_tempered_zero() {
        let mut board = Board::new_game();
        let mut ctx = context();
        ctx.shared.request_stop();
        let result = negamax(&mut board, &mut ctx, 4, -SCORE_INFINITY, SCORE_INFINITY, 0);
        assert_eq!(result, NodeResult::ABORTED);
    }

    #[test]
    fn repetition_guard_simulates_the_move() {
        let mut board = Board::new_game();
        for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = parse_long_algebraic(&board, text).expect("move should be legal");
            board.make_move(mv);
        }
        // Nf3 now re-enters a position already on the board history.
        let again = parse_long_algebraic(&board, "g1f3").expect("move should be legal");
        let fresh = parse_long_algebraic(&board, "e2e4").expect("move should be legal");
        assert!(leads_to_repetition(&mut board, again));
        assert!(!leads_to_repetition(&mut board, fresh));
        assert_eq!(board.hash(), board.recompute_hash());
    }
}
