//! Static exchange evaluation.
//!
//! Plays out every capture on one square, cheapest attacker first, on a
//! scratch occupancy mask. Sliders hidden behind a piece that has already
//! captured join in because attackers are recomputed after each removal.

use crate::game_state::chess_rules::piece_value;
use crate::game_state::{board::Board, chess_types::*};
use crate::move_generation::legal_moves_pawn::en_passant_victim_square;
use crate::moves::bit_utils::{lsb, square_bit};
use crate::moves::move_descriptions::Move;

const MAX_EXCHANGE_DEPTH: usize = 32;

/// Net material for the side moving `from -> to` after optimal recaptures.
pub fn see(board: &Board, from: Square, to: Square, captured: Option<PieceKind>) -> i32 {
    exchange(board, from, to, captured, None, false)
}

/// [`see`] for a generated move, aware of promotion and en passant.
pub fn see_move(board: &Board, mv: &Move) -> i32 {
    exchange(
        board,
        mv.from,
        mv.to,
        mv.captured_piece,
        mv.promotion_piece,
        mv.is_en_passant,
    )
}

fn exchange(
    board: &Board,
    from: Square,
    to: Square,
    captured: Option<PieceKind>,
    promotion: Option<PieceKind>,
    en_passant: bool,
) -> i32 {
    let Some((us, mover)) = board.piece_on(from) else {
        return 0;
    };

    let mut gain = [0i32; MAX_EXCHANGE_DEPTH];
    gain[0] = captured.map_or(0, piece_value);
    let mut on_square = piece_value(mover);
    if let Some(promo) = promotion {
        gain[0] += piece_value(promo) - piece_value(PieceKind::Pawn);
        on_square = piece_value(promo);
    }

    // Nobody may legally take a king, so its capture ends the sequence.
    if mover == PieceKind::King {
        return gain[0];
    }

    let mut occupancy = board.occupancy() & !square_bit(from);
    if en_passant {
        occupancy &= !square_bit(en_passant_victim_square(from, to));
    }

    let mut side = us.opposite();
    let mut depth = 0usize;

    loop {
        let attackers = board.attackers_to(to, occupancy) & occupancy;
        let Some((square, piece)) = least_valuable_attacker(board, side, attackers) else {
            break;
        };

        if piece == PieceKind::King {
            let remaining =
                attackers & !square_bit(square) & board.color_occupancy(side.opposite());
            if remaining != 0 {
                break;
            }
        }

        depth += 1;
        if depth >= MAX_EXCHANGE_DEPTH {
            break;
        }
        gain[depth] = on_square - gain[depth - 1];
        on_square = piece_value(piece);

        if piece == PieceKind::Pawn && relative_rank(side, to) == 7 {
            let promo_gain = piece_value(PieceKind::Queen) - piece_value(PieceKind::Pawn);
            gain[depth] += promo_gain;
            on_square = piece_value(PieceKind::Queen);
        }

        occupancy &= !square_bit(square);
        side = side.opposite();
    }

    while depth > 0 {
        gain[depth - 1] = -(-gain[depth - 1]).max(gain[depth]);
        depth -= 1;
    }
    gain[0]
}

fn least_valuable_attacker(
    board: &Board,
    side: Color,
    attackers: u64,
) -> Option<(Square, PieceKind)> {
    let own = attackers & board.color_occupancy(side);
    if own == 0 {
        return None;
    }
    PieceKind::ALL.into_iter().find_map(|piece| {
        let candidates = own & board.pieces(side, piece);
        (candidates != 0).then(|| (lsb(candidates), piece))
    })
}
