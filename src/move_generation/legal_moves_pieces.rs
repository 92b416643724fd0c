//! Knight, bishop, rook and queen generation.
//!
//! All four share one loop: look up the attack set, intersect it with the
//! square's legality mask, emit a move per destination.

use crate::game_state::{board::Board, chess_types::*};
use crate::move_generation::legal_move_checks::LegalityContext;
use crate::moves::bit_utils::Squares;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::move_descriptions::Move;
use crate::moves::slider_moves::{bishop_attacks, queen_attacks, rook_attacks};

const NON_KING_PIECES: [PieceKind; 4] = [
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
];

#[inline]
fn piece_attacks(piece: PieceKind, from: Square, occupancy: u64) -> u64 {
    match piece {
        PieceKind::Knight => knight_attacks(from),
        PieceKind::Bishop => bishop_attacks(from, occupancy),
        PieceKind::Rook => rook_attacks(from, occupancy),
        PieceKind::Queen => queen_attacks(from, occupancy),
        PieceKind::Pawn | PieceKind::King => 0,
    }
}

pub fn generate_piece_moves(board: &Board, ctx: &LegalityContext, out: &mut Vec<Move>) {
    for piece in NON_KING_PIECES {
        for from in Squares(board.pieces(ctx.us, piece)) {
            let targets = piece_attacks(piece, from, ctx.occupancy) & ctx.destination_mask(from);
            for to in Squares(targets) {
                out.push(Move {
                    captured_piece: board.piece_kind_on(to),
                    ..Move::quiet(from, to, piece, ctx.us)
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::game_state::board::Board;
    use crate::move_generation::legal_move_generator::generate_moves;

    fn destinations_from(fen: &str, from: &str) -> Vec<String> {
        let board = Board::from_fen(fen).expect("FEN should parse");
        let mut out: Vec<String> = generate_moves(&board, false)
            .into_iter()
            .map(|mv| mv.to_string())
            .filter(|text| text.starts_with(from))
            .map(|text| text[2..].to_owned())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn pinned_bishop_moves_only_along_the_pin_ray() {
        let found = destinations_from("6k1/8/8/8/7q/8/5B2/4K3 w - - 0 1", "f2");
        assert_eq!(found, vec!["g3", "h4"]);
    }

    #[test]
    fn pinned_knight_cannot_move() {
        assert!(destinations_from("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1", "e2").is_empty());
    }

    #[test]
    fn single_check_allows_only_capture_or_block() {
        let found = destinations_from("4r1k1/8/8/8/8/8/8/R3K3 w - - 0 1", "a1");
        assert!(found.is_empty());
        let found = destinations_from("4r1k1/8/8/8/8/8/8/3RK3 w - - 0 1", "d1");
        assert!(found.is_empty());
        let found = destinations_from("4r1k1/8/8/8/8/8/8/3QK3 w - - 0 1", "d1");
        assert_eq!(found, vec!["e2"]);
    }
}
