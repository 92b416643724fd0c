use crate::game_state::{board::Board, chess_rules::CASTLING_PATHS, chess_types::*};
use crate::move_generation::legal_move_checks::LegalityContext;
use crate::moves::bit_utils::{square_bit, Squares};
use crate::moves::king_moves::king_attacks;
use crate::moves::move_descriptions::Move;

pub fn generate_king_moves(
    board: &Board,
    ctx: &LegalityContext,
    captures_only: bool,
    out: &mut Vec<Move>,
) {
    let from = ctx.king_square;
    let targets = king_attacks(from) & !ctx.own & ctx.capture_filter;

    for to in Squares(targets) {
        // The attack query lifts our king off the board, so retreating along
        // a checking line is correctly rejected.
        if board.count_attacker_on_square(to, ctx.them, 1, false).0 > 0 {
            continue;
        }
        out.push(Move {
            captured_piece: board.piece_kind_on(to),
            ..Move::quiet(from, to, PieceKind::King, ctx.us)
        });
    }

    if !captures_only && !ctx.check.in_check() {
        generate_castling_moves(board, ctx, out);
    }
}

fn generate_castling_moves(board: &Board, ctx: &LegalityContext, out: &mut Vec<Move>) {
    let rights = board.castling_rights();
    let rooks = board.pieces(ctx.us, PieceKind::Rook);

    for path in &CASTLING_PATHS[ctx.us.index()] {
        if rights & path.right == 0
            || ctx.king_square != path.king_from
            || rooks & square_bit(path.rook_from) == 0
            || ctx.occupancy & path.empty_mask != 0
        {
            continue;
        }

        let transit_attacked = Squares(path.transit_mask)
            .any(|sq| board.count_attacker_on_square(sq, ctx.them, 1, false).0 > 0);
        if transit_attacked {
            continue;
        }

        out.push(Move {
            is_castle: true,
            ..Move::quiet(path.king_from, path.king_to, PieceKind::King, ctx.us)
        });
    }
}
