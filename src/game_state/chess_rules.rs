//! Canonical chess-rule constants.
//!
//! Static literals shared by position setup, evaluation and search: the
//! starting FEN, piece values, game-phase weights and castling geometry.

use crate::game_state::chess_types::*;

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Material value per piece kind, indexed by `PieceKind::index()`.
pub const PIECE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 20_000];

/// Contribution of each piece kind to the game-phase accumulator.
pub const PHASE_WEIGHTS: [i32; 6] = [0, 1, 1, 2, 4, 0];

/// Phase value of the full starting material (pure middlegame).
pub const MAX_GAME_PHASE: i32 = 24;

#[inline]
pub const fn piece_value(piece: PieceKind) -> i32 {
    PIECE_VALUES[piece.index()]
}

/// Castling-rights bits cleared when a piece leaves or lands on a square.
///
/// Indexed by square; touching a king or rook home square drops the
/// corresponding rights.
pub const CASTLING_RIGHTS_MASK: [CastlingRights; 64] = build_castling_rights_mask();

const fn build_castling_rights_mask() -> [CastlingRights; 64] {
    let mut table = [0u8; 64];
    table[0] = CASTLE_LIGHT_QUEENSIDE;
    table[4] = CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE;
    table[7] = CASTLE_LIGHT_KINGSIDE;
    table[56] = CASTLE_DARK_QUEENSIDE;
    table[60] = CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE;
    table[63] = CASTLE_DARK_KINGSIDE;
    table
}

/// Geometry of one castling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingPath {
    pub right: CastlingRights,
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// Squares that must be empty.
    pub empty_mask: u64,
    /// Squares the king crosses or lands on, which must not be attacked.
    pub transit_mask: u64,
}

pub const CASTLING_PATHS: [[CastlingPath; 2]; 2] = [
    [
        CastlingPath {
            right: CASTLE_LIGHT_KINGSIDE,
            king_from: 4,
            king_to: 6,
            rook_from: 7,
            rook_to: 5,
            empty_mask: (1 << 5) | (1 << 6),
            transit_mask: (1 << 5) | (1 << 6),
        },
        CastlingPath {
            right: CASTLE_LIGHT_QUEENSIDE,
            king_from: 4,
            king_to: 2,
            rook_from: 0,
            rook_to: 3,
            empty_mask: (1 << 1) | (1 << 2) | (1 << 3),
            transit_mask: (1 << 2) | (1 << 3),
        },
    ],
    [
        CastlingPath {
            right: CASTLE_DARK_KINGSIDE,
            king_from: 60,
            king_to: 62,
            rook_from: 63,
            rook_to: 61,
            empty_mask: (1 << 61) | (1 << 62),
            transit_mask: (1 << 61) | (1 << 62),
        },
        CastlingPath {
            right: CASTLE_DARK_QUEENSIDE,
            king_from: 60,
            king_to: 58,
            rook_from: 56,
            rook_to: 59,
            empty_mask: (1 << 57) | (1 << 58) | (1 << 59),
            transit_mask: (1 << 58) | (1 << 59),
        },
    ],
];

/// Find the castling path whose king destination is `king_to`.
#[inline]
pub fn castling_path_for(color: Color, king_to: Square) -> Option<&'static CastlingPath> {
    CASTLING_PATHS[color.index()]
        .iter()
        .find(|path| path.king_to == king_to)
}
