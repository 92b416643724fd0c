//! Full legal move generation pipeline.
//!
//! Pins and checks are analysed up front, so every generated move is legal
//! without a make/undo probe. Under double check only the king moves.

use crate::game_state::board::Board;
use crate::move_generation::legal_move_checks::LegalityContext;
use crate::move_generation::legal_moves_king::generate_king_moves;
use crate::move_generation::legal_moves_pawn::generate_pawn_moves;
use crate::move_generation::legal_moves_pieces::generate_piece_moves;
use crate::moves::move_descriptions::Move;

/// Legal moves for the side to move. With `captures_only` the list holds
/// captures (en passant included) and every promotion.
pub fn generate_moves(board: &Board, captures_only: bool) -> Vec<Move> {
    let mut out = Vec::with_capacity(if captures_only { 32 } else { 64 });
    generate_moves_into(board, captures_only, &mut out);
    out
}

/// Same as [`generate_moves`], appending into a caller-owned buffer.
pub fn generate_moves_into(board: &Board, captures_only: bool, out: &mut Vec<Move>) {
    let ctx = LegalityContext::new(board, captures_only);

    if !ctx.check.is_double_check() {
        generate_pawn_moves(board, &ctx, captures_only, out);
        generate_piece_moves(board, &ctx, out);
    }
    generate_king_moves(board, &ctx, captures_only, out);
}
