//! Zobrist keys for the position hash and the pawn key.
//!
//! Keys come from a fixed-seed SplitMix64 stream, so a position hashes to the
//! same value in every run and every thread.

use std::sync::OnceLock;

use crate::game_state::{board::Board, chess_types::*};
use crate::moves::bit_utils::Squares;

const KEY_SEED: u64 = 0x2545_F491_4F6C_DD1D;

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; 64]; 6]; 2],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(|| ZobristTables::generate(&mut SplitMix64(KEY_SEED)))
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn next_key(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl ZobristTables {
    fn generate(stream: &mut SplitMix64) -> Self {
        let piece_square = std::array::from_fn(|_| {
            std::array::from_fn(|_| std::array::from_fn(|_| stream.next_key()))
        });
        let side_to_move = stream.next_key();
        // Mask 0 maps to 0: a board without rights carries no castling term.
        let castling = std::array::from_fn(|mask| if mask == 0 { 0 } else { stream.next_key() });
        let en_passant_file = std::array::from_fn(|_| stream.next_key());
        Self {
            piece_square,
            side_to_move,
            castling,
            en_passant_file,
        }
    }
}

#[inline]
pub fn piece_square_key(color: Color, piece: PieceKind, square: Square) -> u64 {
    tables().piece_square[color.index()][piece.index()][square as usize]
}

/// Key for a whole castling-rights mask (`0..=15`).
#[inline]
pub fn castling_key(castling_rights: CastlingRights) -> u64 {
    tables().castling[(castling_rights & 0x0F) as usize]
}

#[inline]
pub fn en_passant_file_key(square: Square) -> u64 {
    tables().en_passant_file[(square % 8) as usize]
}

/// Side-to-move toggle key (xor in when dark to move).
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// Full position key rebuilt from scratch.
pub fn compute_zobrist_key(board: &Board) -> u64 {
    let mut key = 0u64;

    for color in [Color::Light, Color::Dark] {
        for piece in PieceKind::ALL {
            for sq in Squares(board.pieces(color, piece)) {
                key ^= piece_square_key(color, piece, sq);
            }
        }
    }

    if board.side_to_move() == Color::Dark {
        key ^= side_to_move_key();
    }

    key ^= castling_key(board.castling_rights());

    if let Some(ep_square) = board.en_passant_square() {
        key ^= en_passant_file_key(ep_square);
    }

    key
}

/// Pawn-structure key over pawns and kings, rebuilt from scratch.
pub fn compute_pawn_zobrist_key(board: &Board) -> u64 {
    let mut key = 0u64;

    for color in [Color::Light, Color::Dark] {
        for piece in [PieceKind::Pawn, PieceKind::King] {
            for sq in Squares(board.pieces(color, piece)) {
                key ^= piece_square_key(color, piece, sq);
            }
        }
    }

    key
}

#[cfg(test)]
mod tests {
    use super::{compute_pawn_zobrist_key, compute_zobrist_key};
    use crate::game_state::board::Board;
    use crate::utils::long_algebraic::parse_long_algebraic;

    #[test]
    fn starting_position_hash_is_deterministic() {
        let a = Board::new_game();
        let b = Board::new_game();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.pawn_key(), b.pawn_key());
    }

    #[test]
    fn side_to_move_changes_hash() {
        let w = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let b = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").expect("FEN should parse");
        assert_ne!(w.hash(), b.hash());
        assert_eq!(w.pawn_key(), b.pawn_key());
    }

    #[test]
    fn castling_rights_change_hash() {
        let with_rights =
            Board::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").expect("FEN should parse");
        let without_rights =
            Board::from_fen("4k3/8/8/8/8/8/8/R3K2R w - - 0 1").expect("FEN should parse");
        assert_ne!(with_rights.hash(), without_rights.hash());
    }

    #[test]
    fn en_passant_file_changes_hash() {
        let no_ep = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let ep = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").expect("FEN should parse");
        assert_ne!(no_ep.hash(), ep.hash());
    }

    #[test]
    fn incremental_keys_match_recompute_after_moves() {
        let mut board = Board::new_game();
        for text in ["e2e4", "d7d5", "e4d5", "g8f6", "f1b5", "c7c6", "g1f3", "c6b5", "e1g1"] {
            let mv = parse_long_algebraic(&board, text).expect("move should be legal");
            board.make_move(mv);
            assert_eq!(board.hash(), compute_zobrist_key(&board), "after {text}");
            assert_eq!(board.pawn_key(), compute_pawn_zobrist_key(&board), "after {text}");
        }
    }
}
