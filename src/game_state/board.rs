//! Bitboard position with incremental hash, material and positional scores.
//!
//! A `Board` is mutated only through `make_move`/`undo_move` and the null-move
//! pair (see `make_move.rs`). Each search thread owns its own copy.

use crate::errors::FenError;
use crate::game_state::board_snapshot::{PositionState, SnapshotStack};
use crate::game_state::chess_rules::{
    castling_path_for, piece_value, MAX_GAME_PHASE, PHASE_WEIGHTS, STARTING_POSITION_FEN,
};
use crate::game_state::chess_types::*;
use crate::game_state::piece_square_tables::pst_bonus;
use crate::game_state::repetition::RepetitionTracker;
use crate::moves::bit_utils::{lsb, square_bit};
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::move_descriptions::{Move, PackedMove};
use crate::moves::pawn_moves::pawn_attacks;
use crate::moves::slider_moves::{bishop_attacks, rook_attacks};
use crate::search::zobrist::{compute_pawn_zobrist_key, compute_zobrist_key};
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

/// Undo slots reserved up front; enough for a long game plus a deep search.
const HISTORY_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) state: PositionState,
    pub(crate) history: SnapshotStack,
    pub(crate) repetition: RepetitionTracker,
}

impl Default for Board {
    fn default() -> Self {
        Self::new_game()
    }
}

impl Board {
    /// Board with no pieces. Used as the starting point for FEN setup.
    pub fn new_empty() -> Self {
        Self {
            state: PositionState::empty(),
            history: SnapshotStack::with_capacity(HISTORY_CAPACITY),
            repetition: RepetitionTracker::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn new_game() -> Self {
        parse_fen(STARTING_POSITION_FEN).unwrap_or_else(|_| Self::new_empty())
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        parse_fen(fen)
    }

    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    /// Put a piece on an empty square while setting up a position.
    ///
    /// Keeps occupancy, material, positional and phase totals in step.
    /// Hashes are rebuilt afterwards by [`Board::finish_setup`].
    pub(crate) fn place_piece(&mut self, color: Color, piece: PieceKind, square: Square) {
        let bit = square_bit(square);
        debug_assert_eq!(self.state.occupancy_all & bit, 0, "square already occupied");
        self.state.pieces[color.index()][piece.index()] |= bit;
        self.state.occupancy_by_color[color.index()] |= bit;
        self.state.occupancy_all |= bit;
        self.state.material_score += color.sign() * piece_value(piece);
        let (mg, eg) = pst_bonus(color, piece, square);
        self.state.positional_mg += color.sign() * mg;
        self.state.positional_eg += color.sign() * eg;
        self.state.game_phase += PHASE_WEIGHTS[piece.index()];
        if piece == PieceKind::King {
            self.state.king_squares[color.index()] = square;
        }
    }

    /// Validate kings and derive hashes once every field has been set.
    pub(crate) fn finish_setup(&mut self) -> Result<(), FenError> {
        for color in [Color::Light, Color::Dark] {
            if self.pieces(color, PieceKind::King).count_ones() != 1 {
                return Err(FenError::KingCount);
            }
        }
        self.state.zobrist_key = compute_zobrist_key(self);
        self.state.pawn_zobrist_key = compute_pawn_zobrist_key(self);
        self.history.clear();
        self.repetition.clear();
        self.repetition.push(self.state.zobrist_key);
        Ok(())
    }

    #[inline]
    pub fn pieces(&self, color: Color, piece: PieceKind) -> u64 {
        self.state.pieces[color.index()][piece.index()]
    }

    #[inline]
    pub fn color_occupancy(&self, color: Color) -> u64 {
        self.state.occupancy_by_color[color.index()]
    }

    #[inline]
    pub fn occupancy(&self) -> u64 {
        self.state.occupancy_all
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.state.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.state.castling_rights
    }

    #[inline]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.state.en_passant_square
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.state.king_squares[color.index()]
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.state.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.state.fullmove_number
    }

    /// Full position zobrist key.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.state.zobrist_key
    }

    /// Pawn-and-king zobrist key.
    #[inline]
    pub fn pawn_key(&self) -> u64 {
        self.state.pawn_zobrist_key
    }

    /// Light-minus-dark material.
    #[inline]
    pub fn material_score(&self) -> i32 {
        self.state.material_score
    }

    /// Phase accumulator clamped to `0..=24` (24 = full middlegame).
    #[inline]
    pub fn game_phase(&self) -> i32 {
        self.state.game_phase.min(MAX_GAME_PHASE)
    }

    /// Light-minus-dark piece-square score tapered by game phase.
    #[inline]
    pub fn positional_score(&self) -> i32 {
        let phase = self.game_phase();
        (self.state.positional_mg * phase + self.state.positional_eg * (MAX_GAME_PHASE - phase))
            / MAX_GAME_PHASE
    }

    pub fn piece_on(&self, square: Square) -> Option<(Color, PieceKind)> {
        let bit = square_bit(square);
        if self.state.occupancy_all & bit == 0 {
            return None;
        }
        let color = if self.color_occupancy(Color::Light) & bit != 0 {
            Color::Light
        } else {
            Color::Dark
        };
        PieceKind::ALL
            .into_iter()
            .find(|&piece| self.pieces(color, piece) & bit != 0)
            .map(|piece| (color, piece))
    }

    #[inline]
    pub fn piece_kind_on(&self, square: Square) -> Option<PieceKind> {
        self.piece_on(square).map(|(_, piece)| piece)
    }

    /// Attackers of `attacker_color` on `square`, capped at `bound`, plus one
    /// attacking square when `need_square` is set.
    ///
    /// Sliding attacks are traced with the defending king lifted off the
    /// board, so a square behind the king on a checking line counts as
    /// attacked. That is what king-move legality needs.
    pub fn count_attacker_on_square(
        &self,
        square: Square,
        attacker_color: Color,
        bound: u32,
        need_square: bool,
    ) -> (u32, Option<Square>) {
        let defender = attacker_color.opposite();
        let occupancy =
            self.state.occupancy_all & !square_bit(self.king_square(defender));
        let attackers = self.attackers_of_color(square, attacker_color, occupancy);

        if attackers == 0 {
            return (0, None);
        }
        let count = attackers.count_ones().min(bound);
        let attacker_square = if need_square { Some(lsb(attackers)) } else { None };
        (count, attacker_square)
    }

    /// Bitboard of `color`'s pieces attacking `square` under `occupancy`.
    #[inline]
    pub fn attackers_of_color(&self, square: Square, color: Color, occupancy: u64) -> u64 {
        let c = color.index();
        let p = &self.state.pieces[c];
        let diagonal = p[PieceKind::Bishop.index()] | p[PieceKind::Queen.index()];
        let orthogonal = p[PieceKind::Rook.index()] | p[PieceKind::Queen.index()];

        (pawn_attacks(color.opposite(), square) & p[PieceKind::Pawn.index()])
            | (knight_attacks(square) & p[PieceKind::Knight.index()])
            | (king_attacks(square) & p[PieceKind::King.index()])
            | (bishop_attacks(square, occupancy) & diagonal)
            | (rook_attacks(square, occupancy) & orthogonal)
    }

    /// Both colors' attackers of `square` under `occupancy`.
    #[inline]
    pub fn attackers_to(&self, square: Square, occupancy: u64) -> u64 {
        self.attackers_of_color(square, Color::Light, occupancy)
            | self.attackers_of_color(square, Color::Dark, occupancy)
    }

    #[inline]
    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        self.count_attacker_on_square(square, by, 1, false).0 > 0
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        let us = self.side_to_move();
        self.is_square_attacked(self.king_square(us), us.opposite())
    }

    /// True when the current position occurred at least `n` times (this
    /// occurrence included) since the last irreversible move.
    pub fn is_repetition_draw(&self, n: usize) -> bool {
        self.repetition_count(self.hash()) >= n
    }

    /// Occurrences of `key`, for the side to move, since the last
    /// irreversible move or null move, whichever is closer.
    #[inline]
    pub fn repetition_count(&self, key: u64) -> usize {
        let reversible = self.state.halfmove_clock.min(self.state.plies_from_null);
        let window = usize::from(reversible) + 1;
        self.repetition.count(key, window)
    }

    #[inline]
    pub fn is_fifty_move_rule_draw(&self) -> bool {
        self.state.halfmove_clock >= 100
    }

    /// The side to move has a knight, bishop, rook or queen.
    #[inline]
    pub fn has_enough_material_for_nmp(&self) -> bool {
        let p = &self.state.pieces[self.side_to_move().index()];
        (p[PieceKind::Knight.index()]
            | p[PieceKind::Bishop.index()]
            | p[PieceKind::Rook.index()]
            | p[PieceKind::Queen.index()])
            != 0
    }

    /// Rebuild the full hash from scratch (for verification).
    pub fn recompute_hash(&self) -> u64 {
        compute_zobrist_key(self)
    }

    /// Rebuild the pawn key from scratch (for verification).
    pub fn recompute_pawn_key(&self) -> u64 {
        compute_pawn_zobrist_key(self)
    }

    /// Structural invariants: occupancy unions and one piece per square.
    pub fn is_consistent(&self) -> bool {
        let mut seen = 0u64;
        for color in [Color::Light, Color::Dark] {
            let mut union = 0u64;
            for piece in PieceKind::ALL {
                let bb = self.pieces(color, piece);
                if seen & bb != 0 {
                    return false;
                }
                seen |= bb;
                union |= bb;
            }
            if union != self.color_occupancy(color) {
                return false;
            }
        }
        seen == self.state.occupancy_all
            && self.state.zobrist_key == compute_zobrist_key(self)
            && self.state.pawn_zobrist_key == compute_pawn_zobrist_key(self)
    }

    /// Position equality ignoring undo history.
    pub fn same_position(&self, other: &Board) -> bool {
        self.state == other.state
    }

    /// Rebuild a full move from its packed form against this position.
    ///
    /// Returns `None` unless the move is pseudo-legal here: our piece on
    /// `from`, a reachable `to` that holds no friendly piece or king, and a
    /// promotion exactly when a pawn reaches the last rank. King safety is
    /// not checked.
    pub fn move_from_packed(&self, packed: PackedMove) -> Option<Move> {
        if packed.is_none() {
            return None;
        }
        let us = self.side_to_move();
        let (from, to) = (packed.from_square(), packed.to_square());
        let (owner, piece) = self.piece_on(from)?;
        if owner != us || self.color_occupancy(us) & square_bit(to) != 0 {
            return None;
        }
        let captured = self.piece_kind_on(to);
        if captured == Some(PieceKind::King) {
            return None;
        }

        let occupancy = self.occupancy();
        let mut mv = Move {
            captured_piece: captured,
            ..Move::quiet(from, to, piece, us)
        };

        match piece {
            PieceKind::Pawn => {
                let last_rank = relative_rank(us, to) == 7;
                if last_rank != packed.promotion().is_some() {
                    return None;
                }
                mv.promotion_piece = packed.promotion();

                let forward: i8 = if us == Color::Light { 8 } else { -8 };
                let one_step = from as i8 + forward;
                let diagonal = pawn_attacks(us, from) & square_bit(to) != 0;
                if diagonal {
                    if captured.is_none() {
                        if self.en_passant_square() != Some(to) {
                            return None;
                        }
                        mv.captured_piece = Some(PieceKind::Pawn);
                        mv.is_en_passant = true;
                    }
                } else if to as i8 == one_step {
                    if captured.is_some() {
                        return None;
                    }
                } else if to as i8 == one_step + forward && relative_rank(us, from) == 1 {
                    let both = square_bit(one_step as Square) | square_bit(to);
                    if occupancy & both != 0 {
                        return None;
                    }
                } else {
                    return None;
                }
            }
            _ if packed.promotion().is_some() => return None,
            PieceKind::King => {
                if king_attacks(from) & square_bit(to) == 0 {
                    let path = castling_path_for(us, to)?;
                    if path.king_from != from
                        || self.castling_rights() & path.right == 0
                        || occupancy & path.empty_mask != 0
                        || self.pieces(us, PieceKind::Rook) & square_bit(path.rook_from) == 0
                    {
                        return None;
                    }
                    mv.is_castle = true;
                }
            }
            PieceKind::Knight => {
                if knight_attacks(from) & square_bit(to) == 0 {
                    return None;
                }
            }
            PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
                let mut attacks = 0;
                if piece != PieceKind::Rook {
                    attacks |= bishop_attacks(from, occupancy);
                }
                if piece != PieceKind::Bishop {
                    attacks |= rook_attacks(from, occupancy);
                }
                if attacks & square_bit(to) == 0 {
                    return None;
                }
            }
        }

        Some(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::Board;
    use crate::game_state::chess_types::*;

    #[test]
    fn starting_position_has_expected_setup() {
        let board = Board::new_game();
        assert_eq!(board.side_to_move(), Color::Light);
        assert_eq!(board.occupancy().count_ones(), 32);
        assert_eq!(board.castling_rights(), CASTLE_ALL);
        assert_eq!(board.material_score(), 0);
        assert_eq!(board.positional_score(), 0);
        assert_eq!(board.game_phase(), 24);
        assert_eq!(board.king_square(Color::Dark), 60);
        assert!(board.is_consistent());
        assert!(!board.in_check());
    }

    #[test]
    fn piece_on_reports_color_and_kind() {
        let board = Board::new_game();
        assert_eq!(board.piece_on(3), Some((Color::Light, PieceKind::Queen)));
        assert_eq!(board.piece_on(62), Some((Color::Dark, PieceKind::Knight)));
        assert_eq!(board.piece_on(28), None);
    }

    #[test]
    fn attacker_count_is_capped_and_reports_a_square() {
        // Dark king on e8 attacked by rook e1 and knight d6.
        let board = Board::from_fen("4k3/8/3N4/8/8/8/8/4RK2 b - - 0 1").expect("FEN should parse");
        let (count, square) = board.count_attacker_on_square(60, Color::Light, 2, true);
        assert_eq!(count, 2);
        assert!(square == Some(4) || square == Some(43));
        let (capped, none) = board.count_attacker_on_square(60, Color::Light, 1, false);
        assert_eq!(capped, 1);
        assert_eq!(none, None);
        assert!(board.in_check());
    }

    #[test]
    fn square_behind_king_on_checking_line_counts_as_attacked() {
        // Rook a1 checks the dark king on e1; f1 is still covered by the rook.
        let board = Board::from_fen("8/8/8/8/8/8/7K/R3k3 b - - 0 1").expect("FEN should parse");
        assert!(board.is_square_attacked(5, Color::Light));
    }

    #[test]
    fn nmp_material_gate_ignores_pawns() {
        let pawns_only = Board::from_fen("4k3/pppp4/8/8/8/8/PPPP4/4K3 w - - 0 1").expect("FEN should parse");
        assert!(!pawns_only.has_enough_material_for_nmp());
        let with_knight = Board::from_fen("4k3/8/8/8/8/8/8/4KN2 w - - 0 1").expect("FEN should parse");
        assert!(with_knight.has_enough_material_for_nmp());
    }

    #[test]
    fn fifty_move_rule_triggers_at_one_hundred_plies() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 100 80").expect("FEN should parse");
        assert!(board.is_fifty_move_rule_draw());
    }

    #[test]
    fn fen_round_trips() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board = Board::from_fen(fen).expect("FEN should parse");
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn packed_moves_recover_flags_and_reject_garbage() {
        use crate::move_generation::legal_move_generator::generate_moves;
        use crate::moves::move_descriptions::PackedMove;

        let board = Board::from_fen("r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq d6 0 1")
            .expect("FEN should parse");
        for mv in generate_moves(&board, false) {
            let rebuilt = board
                .move_from_packed(mv.pack())
                .expect("legal move should unpack");
            assert_eq!(rebuilt, mv);
            assert_eq!(rebuilt.is_castle, mv.is_castle);
            assert_eq!(rebuilt.is_en_passant, mv.is_en_passant);
            assert_eq!(rebuilt.captured_piece, mv.captured_piece);
        }

        // Empty from-square, enemy piece, open rook file, king jump.
        assert!(board.move_from_packed(PackedMove::new(20, 28, None)).is_none());
        assert!(board.move_from_packed(PackedMove::new(56, 48, None)).is_none());
        assert!(board.move_from_packed(PackedMove::new(0, 24, None)).is_some());
        assert!(board.move_from_packed(PackedMove::new(4, 20, None)).is_none());
        assert!(board.move_from_packed(PackedMove::NONE).is_none());
    }
}
