//! In-place make/undo for real moves and null moves, plus scope guards.
//!
//! `make_move` saves the whole [`PositionState`](crate::game_state::board_snapshot::PositionState)
//! before touching anything, so `undo_move` is a single copy back. Calls must
//! nest strictly; the guards below enforce that by undoing on drop.

use std::ops::{Deref, DerefMut};

use crate::game_state::board::Board;
use crate::game_state::chess_rules::{
    castling_path_for, piece_value, CASTLING_RIGHTS_MASK, PHASE_WEIGHTS,
};
use crate::game_state::chess_types::*;
use crate::game_state::piece_square_tables::pst_bonus;
use crate::moves::bit_utils::square_bit;
use crate::moves::move_descriptions::Move;
use crate::search::zobrist::{
    castling_key, en_passant_file_key, piece_square_key, side_to_move_key,
};

impl Board {
    /// Apply a legal move for the side to move.
    pub fn make_move(&mut self, mv: Move) {
        self.history.push(self.state, mv);

        let us = self.state.side_to_move;
        let them = us.opposite();
        debug_assert_eq!(mv.color, us, "move color must match side to move");

        let captured_square = if mv.is_en_passant {
            match us {
                Color::Light => mv.to - 8,
                Color::Dark => mv.to + 8,
            }
        } else {
            mv.to
        };
        let landing_piece = mv.promotion_piece.unwrap_or(mv.moved_piece);
        let rook_path = if mv.is_castle {
            castling_path_for(us, mv.to)
        } else {
            None
        };

        // Material.
        if let Some(captured) = mv.captured_piece {
            self.state.material_score += us.sign() * piece_value(captured);
        }
        if let Some(promo) = mv.promotion_piece {
            self.state.material_score +=
                us.sign() * (piece_value(promo) - piece_value(PieceKind::Pawn));
        }

        // Positional score and game phase.
        self.shift_pst(us, mv.moved_piece, mv.from, -1);
        self.shift_pst(us, landing_piece, mv.to, 1);
        if let Some(captured) = mv.captured_piece {
            self.shift_pst(them, captured, captured_square, -1);
            self.state.game_phase -= PHASE_WEIGHTS[captured.index()];
        }
        if let Some(promo) = mv.promotion_piece {
            self.state.game_phase += PHASE_WEIGHTS[promo.index()];
        }
        if let Some(path) = rook_path {
            self.shift_pst(us, PieceKind::Rook, path.rook_from, -1);
            self.shift_pst(us, PieceKind::Rook, path.rook_to, 1);
        }

        // Castling rights.
        let old_rights = self.state.castling_rights;
        let touched = CASTLING_RIGHTS_MASK[mv.from as usize] | CASTLING_RIGHTS_MASK[mv.to as usize];
        let new_rights = old_rights & !touched;
        if new_rights != old_rights {
            self.state.zobrist_key ^= castling_key(old_rights) ^ castling_key(new_rights);
            self.state.castling_rights = new_rights;
        }

        // En passant.
        if let Some(old_ep) = self.state.en_passant_square.take() {
            self.state.zobrist_key ^= en_passant_file_key(old_ep);
        }
        if mv.moved_piece == PieceKind::Pawn && mv.from.abs_diff(mv.to) == 16 {
            let ep = (mv.from + mv.to) / 2;
            self.state.en_passant_square = Some(ep);
            self.state.zobrist_key ^= en_passant_file_key(ep);
        }

        // King square cache.
        if mv.moved_piece == PieceKind::King {
            self.state.king_squares[us.index()] = mv.to;
        }

        // Piece bitboards.
        self.toggle_piece(us, mv.moved_piece, mv.from);
        if let Some(captured) = mv.captured_piece {
            self.toggle_piece(them, captured, captured_square);
        }
        self.toggle_piece(us, landing_piece, mv.to);
        if let Some(path) = rook_path {
            self.toggle_piece(us, PieceKind::Rook, path.rook_from);
            self.toggle_piece(us, PieceKind::Rook, path.rook_to);
        }

        // Piece terms of the full and pawn hashes, against the new placement.
        self.state.zobrist_key ^= piece_square_key(us, mv.moved_piece, mv.from)
            ^ piece_square_key(us, landing_piece, mv.to);
        if matches!(mv.moved_piece, PieceKind::Pawn | PieceKind::King) {
            self.state.pawn_zobrist_key ^= piece_square_key(us, mv.moved_piece, mv.from);
        }
        if matches!(landing_piece, PieceKind::Pawn | PieceKind::King) {
            self.state.pawn_zobrist_key ^= piece_square_key(us, landing_piece, mv.to);
        }
        if let Some(captured) = mv.captured_piece {
            let key = piece_square_key(them, captured, captured_square);
            self.state.zobrist_key ^= key;
            if captured == PieceKind::Pawn {
                self.state.pawn_zobrist_key ^= key;
            }
        }
        if let Some(path) = rook_path {
            self.state.zobrist_key ^= piece_square_key(us, PieceKind::Rook, path.rook_from)
                ^ piece_square_key(us, PieceKind::Rook, path.rook_to);
        }

        // Side to move.
        self.state.side_to_move = them;
        self.state.zobrist_key ^= side_to_move_key();

        // Clocks.
        if mv.moved_piece == PieceKind::Pawn || mv.captured_piece.is_some() {
            self.state.halfmove_clock = 0;
        } else {
            self.state.halfmove_clock = self.state.halfmove_clock.saturating_add(1);
        }
        if us == Color::Dark {
            self.state.fullmove_number = self.state.fullmove_number.saturating_add(1);
        }
        self.state.plies_from_null = self.state.plies_from_null.saturating_add(1);

        self.repetition.push(self.state.zobrist_key);

        debug_assert_eq!(self.state.zobrist_key, self.recompute_hash());
        debug_assert_eq!(self.state.pawn_zobrist_key, self.recompute_pawn_key());
    }

    /// Restore the position saved by the matching `make_move`.
    pub fn undo_move(&mut self, mv: Move) {
        let Some(snapshot) = self.history.pop() else {
            debug_assert!(false, "undo_move called with empty history");
            return;
        };
        debug_assert_eq!(snapshot.mv, mv, "undo_move out of order");
        self.state = snapshot.state;
        self.repetition.pop();
    }

    /// Pass the turn. The returned value carries what `undo_null_move`
    /// needs to restore the position exactly.
    pub fn make_null_move(&mut self) -> NullMoveUndo {
        let undo = NullMoveUndo {
            en_passant_square: self.state.en_passant_square.take(),
            plies_from_null: self.state.plies_from_null,
        };
        if let Some(ep) = undo.en_passant_square {
            self.state.zobrist_key ^= en_passant_file_key(ep);
        }
        self.state.side_to_move = self.state.side_to_move.opposite();
        self.state.zobrist_key ^= side_to_move_key();
        // Repetition scans stop here.
        self.state.plies_from_null = 0;
        self.repetition.push(self.state.zobrist_key);
        undo
    }

    pub fn undo_null_move(&mut self, undo: NullMoveUndo) {
        self.repetition.pop();
        self.state.side_to_move = self.state.side_to_move.opposite();
        self.state.zobrist_key ^= side_to_move_key();
        self.state.plies_from_null = undo.plies_from_null;
        if let Some(ep) = undo.en_passant_square {
            self.state.zobrist_key ^= en_passant_file_key(ep);
            self.state.en_passant_square = Some(ep);
        }
    }

    #[inline]
    fn toggle_piece(&mut self, color: Color, piece: PieceKind, square: Square) {
        let bit = square_bit(square);
        self.state.pieces[color.index()][piece.index()] ^= bit;
        self.state.occupancy_by_color[color.index()] ^= bit;
        self.state.occupancy_all ^= bit;
    }

    #[inline]
    fn shift_pst(&mut self, color: Color, piece: PieceKind, square: Square, direction: i32) {
        let (mg, eg) = pst_bonus(color, piece, square);
        self.state.positional_mg += direction * color.sign() * mg;
        self.state.positional_eg += direction * color.sign() * eg;
    }
}

/// State cleared by a null move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullMoveUndo {
    pub en_passant_square: Option<Square>,
    pub plies_from_null: u16,
}

/// Makes a move on construction and undoes it when dropped.
///
/// Derefs to the board so the child search runs through the guard.
pub struct MoveGuard<'a> {
    board: &'a mut Board,
    mv: Move,
}

impl<'a> MoveGuard<'a> {
    #[inline]
    pub fn new(board: &'a mut Board, mv: Move) -> Self {
        board.make_move(mv);
        Self { board, mv }
    }

    #[inline]
    pub fn mv(&self) -> Move {
        self.mv
    }
}

impl Deref for MoveGuard<'_> {
    type Target = Board;

    #[inline]
    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for MoveGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for MoveGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.board.undo_move(self.mv);
    }
}

/// Null-move counterpart of [`MoveGuard`].
pub struct NullMoveGuard<'a> {
    board: &'a mut Board,
    undo: NullMoveUndo,
}

impl<'a> NullMoveGuard<'a> {
    #[inline]
    pub fn new(board: &'a mut Board) -> Self {
        let undo = board.make_null_move();
        Self { board, undo }
    }
}

impl Deref for NullMoveGuard<'_> {
    type Target = Board;

    #[inline]
    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for NullMoveGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for NullMoveGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.board.undo_null_move(self.undo);
    }
}

#[cfg(test)]
mod tests {
    use super::{MoveGuard, NullMoveGuard};
    use crate::game_state::board::Board;
    use crate::game_state::chess_rules::piece_value;
    use crate::game_state::chess_types::*;
    use crate::move_generation::legal_move_generator::generate_moves;
    use crate::utils::long_algebraic::parse_long_algebraic;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn play(board: &mut Board, text: &str) {
        let mv = parse_long_algebraic(board, text).expect("move should be legal");
        board.make_move(mv);
    }

    #[test]
    fn every_legal_move_round_trips_from_test_positions() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let mut board = Board::from_fen(fen).expect("FEN should parse");
            let before = board.clone();
            for mv in generate_moves(&board, false) {
                board.make_move(mv);
                assert!(board.is_consistent(), "{fen} after {mv}");
                board.undo_move(mv);
                assert!(board.same_position(&before), "{fen} undo {mv}");
                assert_eq!(board.hash(), before.hash());
            }
        }
    }

    #[test]
    fn random_playouts_unwind_to_the_start() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..20 {
            let mut board = Board::new_game();
            let start = board.clone();
            let mut played = Vec::new();
            for _ in 0..60 {
                let moves = generate_moves(&board, false);
                if moves.is_empty() {
                    break;
                }
                let mv = moves[rng.random_range(0..moves.len())];
                board.make_move(mv);
                assert_eq!(board.hash(), board.recompute_hash());
                played.push(mv);
            }
            while let Some(mv) = played.pop() {
                board.undo_move(mv);
            }
            assert!(board.same_position(&start));
            assert_eq!(board.hash(), board.recompute_hash());
        }
    }

    #[test]
    fn castling_moves_rook_and_clears_rights() {
        let mut board =
            Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        play(&mut board, "e1g1");
        assert_eq!(board.piece_on(5), Some((Color::Light, PieceKind::Rook)));
        assert_eq!(board.piece_on(7), None);
        assert_eq!(board.castling_rights(), CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE);
        play(&mut board, "a8a1");
        assert_eq!(board.castling_rights(), CASTLE_DARK_KINGSIDE);
        assert!(board.is_consistent());
    }

    #[test]
    fn en_passant_capture_removes_the_passed_pawn() {
        let mut board =
            Board::from_fen("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1").expect("FEN should parse");
        play(&mut board, "d7d5");
        assert_eq!(board.en_passant_square(), Some(43));
        play(&mut board, "e5d6");
        assert_eq!(board.piece_on(35), None);
        assert_eq!(board.pieces(Color::Dark, PieceKind::Pawn), 0);
        assert_eq!(board.material_score(), piece_value(PieceKind::Pawn));
        assert!(board.is_consistent());
    }

    #[test]
    fn promotion_updates_material_and_phase() {
        let mut board = Board::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").expect("FEN should parse");
        let phase_before = board.game_phase();
        play(&mut board, "e7e8q");
        assert_eq!(board.material_score(), 900);
        assert_eq!(board.game_phase(), phase_before + 4);
        assert_eq!(board.pieces(Color::Light, PieceKind::Pawn), 0);
    }

    #[test]
    fn null_move_restores_en_passant_and_hash() {
        let mut board = Board::new_game();
        play(&mut board, "e2e4");
        let before = board.clone();
        let previous = board.make_null_move();
        assert_eq!(previous.en_passant_square, Some(20));
        assert_eq!(board.en_passant_square(), None);
        assert_eq!(board.side_to_move(), Color::Light);
        assert_eq!(board.hash(), board.recompute_hash());
        board.undo_null_move(previous);
        assert!(board.same_position(&before));
    }

    #[test]
    fn guards_undo_on_scope_exit() {
        let mut board = Board::new_game();
        let before = board.clone();
        let mv = parse_long_algebraic(&board, "g1f3").expect("move should be legal");
        {
            let mut guard = MoveGuard::new(&mut board, mv);
            assert_eq!(guard.side_to_move(), Color::Dark);
            let null = NullMoveGuard::new(&mut guard);
            assert_eq!(null.side_to_move(), Color::Light);
        }
        assert!(board.same_position(&before));
    }

    #[test]
    fn threefold_repetition_is_detected() {
        let mut board = Board::new_game();
        for text in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
            assert!(!board.is_repetition_draw(3));
            play(&mut board, text);
        }
        assert!(board.is_repetition_draw(3));
    }

    #[test]
    fn repetition_scan_stops_at_the_last_null_move() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 10 6";
        let mut board = Board::from_fen(fen).expect("FEN should parse");
        let start = board.clone();

        let first = board.make_null_move();
        let out = parse_long_algebraic(&board, "g8f6").expect("move should be legal");
        board.make_move(out);
        let second = board.make_null_move();
        let back = parse_long_algebraic(&board, "f6g8").expect("move should be legal");
        board.make_move(back);
        assert_eq!(board.hash(), start.hash());
        assert_eq!(board.repetition_count(start.hash()), 1);
        assert!(!board.is_repetition_draw(2));

        board.undo_move(back);
        board.undo_null_move(second);
        board.undo_move(out);
        board.undo_null_move(first);
        assert!(board.same_position(&start));

        for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            play(&mut board, text);
        }
        assert_eq!(board.repetition_count(start.hash()), 2);
        assert!(board.is_repetition_draw(2));
    }
}
