use crate::game_state::{board::Board, chess_types::*};
use crate::move_generation::legal_move_checks::LegalityContext;
use crate::moves::bit_utils::{square_bit, RANK_MASKS, Squares};
use crate::moves::move_descriptions::Move;
use crate::moves::pawn_moves::pawn_attacks;
use crate::moves::slider_moves::{bishop_attacks, rook_attacks};

pub fn generate_pawn_moves(
    board: &Board,
    ctx: &LegalityContext,
    captures_only: bool,
    out: &mut Vec<Move>,
) {
    let side = ctx.us;
    let (forward, start_rank, promotion_rank): (i8, u8, u8) = match side {
        Color::Light => (8, 1, 7),
        Color::Dark => (-8, 6, 0),
    };
    let empty = !ctx.occupancy;

    for from in Squares(board.pieces(side, PieceKind::Pawn)) {
        let pin_mask = ctx.pins.allowed(from);
        let one_step = (from as i8 + forward) as Square;

        // Pushes never capture, so only the pin and check masks apply.
        let push_mask = pin_mask & ctx.check.remedy_mask;
        if empty & square_bit(one_step) != 0 {
            if rank_of(one_step) == promotion_rank {
                if push_mask & square_bit(one_step) != 0 {
                    push_promotions(from, one_step, None, side, out);
                }
            } else if !captures_only {
                if push_mask & square_bit(one_step) != 0 {
                    out.push(Move::quiet(from, one_step, PieceKind::Pawn, side));
                }
                if rank_of(from) == start_rank {
                    let two_step = (one_step as i8 + forward) as Square;
                    if empty & push_mask & square_bit(two_step) != 0 {
                        out.push(Move::quiet(from, two_step, PieceKind::Pawn, side));
                    }
                }
            }
        }

        let attacks = pawn_attacks(side, from);
        for to in Squares(attacks & ctx.enemy & pin_mask & ctx.check.remedy_mask) {
            let captured = board.piece_kind_on(to);
            if rank_of(to) == promotion_rank {
                push_promotions(from, to, captured, side, out);
            } else {
                out.push(Move {
                    captured_piece: captured,
                    ..Move::quiet(from, to, PieceKind::Pawn, side)
                });
            }
        }

        if let Some(ep_square) = board.en_passant_square() {
            if attacks & square_bit(ep_square) != 0
                && en_passant_is_legal(board, ctx, from, ep_square)
            {
                out.push(Move {
                    captured_piece: Some(PieceKind::Pawn),
                    is_en_passant: true,
                    ..Move::quiet(from, ep_square, PieceKind::Pawn, side)
                });
            }
        }
    }
}

fn push_promotions(
    from: Square,
    to: Square,
    captured: Option<PieceKind>,
    side: Color,
    out: &mut Vec<Move>,
) {
    for promo in PieceKind::PROMOTIONS {
        out.push(Move {
            captured_piece: captured,
            promotion_piece: Some(promo),
            ..Move::quiet(from, to, PieceKind::Pawn, side)
        });
    }
}

/// Square of the pawn removed by an en-passant capture onto `ep_square`.
#[inline]
pub fn en_passant_victim_square(from: Square, ep_square: Square) -> Square {
    rank_of(from) * 8 + file_of(ep_square)
}

fn en_passant_is_legal(
    board: &Board,
    ctx: &LegalityContext,
    from: Square,
    ep_square: Square,
) -> bool {
    let victim = en_passant_victim_square(from, ep_square);

    // Under check the capture must remove the checker or block the line.
    if ctx.check.in_check()
        && ctx.check.remedy_mask & (square_bit(ep_square) | square_bit(victim)) == 0
    {
        return false;
    }
    if ctx.pins.allowed(from) & square_bit(ep_square) == 0 {
        return false;
    }

    // Two pawns leave the rank at once, which can open a line the pin
    // analysis never saw.
    let occupancy =
        (ctx.occupancy & !square_bit(from) & !square_bit(victim)) | square_bit(ep_square);
    let king = ctx.king_square;
    let them = ctx.them;
    let queens = board.pieces(them, PieceKind::Queen);
    let orthogonal = board.pieces(them, PieceKind::Rook) | queens;
    let diagonal = board.pieces(them, PieceKind::Bishop) | queens;

    if rank_of(king) == rank_of(from)
        && rook_attacks(king, occupancy) & orthogonal & RANK_MASKS[rank_of(king) as usize] != 0
    {
        return false;
    }
    bishop_attacks(king, occupancy) & diagonal == 0
}

#[cfg(test)]
mod tests {
    use crate::game_state::board::Board;
    use crate::move_generation::legal_move_generator::generate_moves;

    #[test]
    fn horizontal_pin_through_en_passant_is_rejected() {
        let board = Board::from_fen("8/8/8/KPp4r/8/8/8/7k w - c6 0 1").expect("FEN should parse");
        let moves = generate_moves(&board, false);
        assert!(moves.iter().all(|mv| !mv.is_en_passant));
        assert!(moves.iter().any(|mv| mv.to_string() == "b5b6"));
    }

    #[test]
    fn en_passant_can_capture_a_checking_pawn() {
        let board = Board::from_fen("8/8/8/2k5/3Pp3/8/8/4K3 b - d3 0 1").expect("FEN should parse");
        let moves = generate_moves(&board, false);
        assert!(moves.iter().any(|mv| mv.is_en_passant && mv.to_string() == "e4d3"));
    }

    #[test]
    fn promotions_expand_to_four_pieces_and_count_as_captures_only_moves() {
        let board = Board::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").expect("FEN should parse");
        let promos: Vec<_> = generate_moves(&board, true);
        assert_eq!(promos.len(), 4);
        assert!(promos.iter().all(|mv| mv.is_promotion()));
    }

    #[test]
    fn blocked_pawn_has_no_pushes() {
        let board = Board::from_fen("4k3/8/8/8/8/4p3/4P3/4K3 w - - 0 1").expect("FEN should parse");
        let moves = generate_moves(&board, false);
        assert!(moves.iter().all(|mv| mv.from != 12));
    }
}
