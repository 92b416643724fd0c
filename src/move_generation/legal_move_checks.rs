//! Pin and check analysis shared by the per-piece generators.
//!
//! Everything here is computed once per `generate_moves` call: a per-square
//! destination mask for pinned pieces, and the set of squares that resolve a
//! single check.

use crate::game_state::{board::Board, chess_types::*};
use crate::moves::bit_utils::square_bit;
use crate::moves::ray_masks::{between, first_blocker, is_orthogonal};

/// Destinations each friendly piece may reach without exposing its king.
///
/// Unpinned squares allow everything. A pinned piece is held to the line
/// between its king and the pinner, the pinner's square included.
#[derive(Debug, Clone)]
pub struct PinnedInfo {
    allowed: [u64; 64],
    pinned: u64,
}

impl PinnedInfo {
    #[inline]
    pub fn allowed(&self, square: Square) -> u64 {
        self.allowed[square as usize]
    }

    /// Bitboard of every pinned friendly piece.
    #[inline]
    pub fn pinned(&self) -> u64 {
        self.pinned
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInfo {
    /// 0, 1 or 2 (the count stops at two).
    pub checkers: u32,
    pub checker_square: Option<Square>,
    /// Squares that capture or block a single checker; all squares otherwise.
    pub remedy_mask: u64,
}

impl CheckInfo {
    #[inline]
    pub fn in_check(&self) -> bool {
        self.checkers > 0
    }

    #[inline]
    pub fn is_double_check(&self) -> bool {
        self.checkers >= 2
    }
}

/// Everything the per-piece generators need about the side to move.
#[derive(Debug, Clone)]
pub struct LegalityContext {
    pub us: Color,
    pub them: Color,
    pub king_square: Square,
    pub own: u64,
    pub enemy: u64,
    pub occupancy: u64,
    pub pins: PinnedInfo,
    pub check: CheckInfo,
    /// Restricts destinations to enemy pieces when only captures are wanted.
    pub capture_filter: u64,
}

impl LegalityContext {
    pub fn new(board: &Board, captures_only: bool) -> Self {
        let us = board.side_to_move();
        let them = us.opposite();
        let enemy = board.color_occupancy(them);
        Self {
            us,
            them,
            king_square: board.king_square(us),
            own: board.color_occupancy(us),
            enemy,
            occupancy: board.occupancy(),
            pins: compute_pinned_info(board, us),
            check: compute_check_info(board, us),
            capture_filter: if captures_only { enemy } else { !0 },
        }
    }

    /// Legal destination mask for a non-king piece standing on `from`.
    #[inline]
    pub fn destination_mask(&self, from: Square) -> u64 {
        !self.own & self.pins.allowed(from) & self.check.remedy_mask & self.capture_filter
    }
}

pub fn compute_pinned_info(board: &Board, color: Color) -> PinnedInfo {
    let mut info = PinnedInfo {
        allowed: [!0u64; 64],
        pinned: 0,
    };

    let king_sq = board.king_square(color);
    let own = board.color_occupancy(color);
    let them = color.opposite();
    let occupancy = board.occupancy();

    let queens = board.pieces(them, PieceKind::Queen);
    let orthogonal_sliders = board.pieces(them, PieceKind::Rook) | queens;
    let diagonal_sliders = board.pieces(them, PieceKind::Bishop) | queens;

    for direction in 0..8 {
        let Some(blocker) = first_blocker(king_sq, direction, occupancy) else {
            continue;
        };
        if own & square_bit(blocker) == 0 {
            continue;
        }
        let Some(pinner) = first_blocker(blocker, direction, occupancy) else {
            continue;
        };

        let sliders = if is_orthogonal(direction) {
            orthogonal_sliders
        } else {
            diagonal_sliders
        };
        if sliders & square_bit(pinner) != 0 {
            info.allowed[blocker as usize] = between(king_sq, pinner) | square_bit(pinner);
            info.pinned |= square_bit(blocker);
        }
    }

    info
}

pub fn compute_check_info(board: &Board, color: Color) -> CheckInfo {
    let king_sq = board.king_square(color);
    let (checkers, checker_square) =
        board.count_attacker_on_square(king_sq, color.opposite(), 2, true);

    let remedy_mask = match (checkers, checker_square) {
        (0, _) => !0,
        (1, Some(sq)) => square_bit(sq) | between(king_sq, sq),
        _ => 0,
    };

    CheckInfo {
        checkers,
        checker_square,
        remedy_mask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::algebraic::algebraic_to_square;

    fn sq(name: &str) -> Square {
        algebraic_to_square(name).expect("test square should parse")
    }

    #[test]
    fn rook_pin_limits_piece_to_the_file() {
        let board = Board::from_fen("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1").expect("FEN should parse");
        let pins = compute_pinned_info(&board, Color::Light);
        let allowed = pins.allowed(sq("e2"));
        assert_ne!(pins.pinned() & square_bit(sq("e2")), 0);
        assert_ne!(allowed & square_bit(sq("e8")), 0);
        assert_ne!(allowed & square_bit(sq("e5")), 0);
        assert_eq!(allowed & square_bit(sq("d3")), 0);
    }

    #[test]
    fn two_friendly_blockers_are_not_pinned() {
        let board =
            Board::from_fen("4r1k1/8/8/8/4N3/8/4B3/4K3 w - - 0 1").expect("FEN should parse");
        let pins = compute_pinned_info(&board, Color::Light);
        assert_eq!(pins.pinned(), 0);
    }

    #[test]
    fn single_slider_check_remedy_includes_blocking_squares() {
        let board = Board::from_fen("6k1/8/8/8/8/8/8/r3K3 w - - 0 1").expect("FEN should parse");
        let check = compute_check_info(&board, Color::Light);
        assert_eq!(check.checkers, 1);
        assert_eq!(check.checker_square, Some(sq("a1")));
        let expected = square_bit(sq("a1")) | square_bit(sq("b1")) | square_bit(sq("c1")) | square_bit(sq("d1"));
        assert_eq!(check.remedy_mask, expected);
    }

    #[test]
    fn double_check_leaves_no_remedy_squares() {
        let board =
            Board::from_fen("4r1k1/8/8/8/8/3n4/8/4K3 w - - 0 1").expect("FEN should parse");
        let check = compute_check_info(&board, Color::Light);
        assert!(check.is_double_check());
        assert_eq!(check.remedy_mask, 0);
    }
}
