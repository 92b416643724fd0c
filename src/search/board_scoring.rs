//! Static evaluation with selectable terms.
//!
//! Search asks for the full evaluation at quiescence leaves and for a cheap
//! subset (material, piece-square, pawn structure) when testing futility.
//! Scores are light-minus-dark centipawns unless stated otherwise.

use crate::game_state::chess_rules::MAX_GAME_PHASE;
use crate::game_state::{board::Board, chess_types::*};
use crate::moves::bit_utils::{adjacent_files, popcount, Squares, FILE_MASKS, RANK_MASKS};
use crate::moves::king_moves::KING_ZONE;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::pawn_moves::{KING_SHIELD_MASKS, PASSED_PAWN_MASKS};
use crate::moves::slider_moves::{bishop_attacks, queen_attacks, rook_attacks};

pub const MATE_SCORE: i32 = 30_000;

/// Bitmask selecting evaluation terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvalTerms(pub u8);

impl EvalTerms {
    pub const MATERIAL: EvalTerms = EvalTerms(1 << 0);
    pub const POSITIONAL: EvalTerms = EvalTerms(1 << 1);
    pub const PAWN_STRUCTURE: EvalTerms = EvalTerms(1 << 2);
    pub const KING_SAFETY: EvalTerms = EvalTerms(1 << 3);
    pub const MOBILITY: EvalTerms = EvalTerms(1 << 4);
    pub const ROOK_ACTIVITY: EvalTerms = EvalTerms(1 << 5);
    pub const BISHOP_PAIR: EvalTerms = EvalTerms(1 << 6);
    pub const ALL: EvalTerms = EvalTerms(0x7F);

    /// Terms used for futility pruning.
    pub const FAST: EvalTerms = EvalTerms(
        Self::MATERIAL.0 | Self::POSITIONAL.0 | Self::PAWN_STRUCTURE.0,
    );

    #[inline]
    pub const fn contains(self, other: EvalTerms) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: EvalTerms) -> EvalTerms {
        EvalTerms(self.0 | other.0)
    }
}

impl std::ops::BitOr for EvalTerms {
    type Output = EvalTerms;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

const DOUBLED_PAWN_PENALTY: i32 = -17;
const ISOLATED_PAWN_PENALTY: i32 = -23;
/// Indexed by rank relative to the pawn's own side.
const PASSED_PAWN_BONUS: [i32; 8] = [0, 10, 20, 35, 50, 75, 100, 0];
const PAWN_SHIELD_BONUS: i32 = 15;
const ATTACKER_WEIGHTS: [i32; 6] = [0, 10, 10, 15, 25, 0];
const KNIGHT_MOBILITY: i32 = 4;
const BISHOP_MOBILITY: i32 = 5;
const ROOK_ON_SEVENTH_BONUS: i32 = 20;
const OPEN_FILE_BONUS: i32 = 25;
const SEMI_OPEN_FILE_BONUS: i32 = 10;
const BISHOP_PAIR_BONUS: i32 = 30;

const DEFAULT_PAWN_CACHE_ENTRIES: usize = 1 << 14;

#[derive(Debug, Clone, Copy, Default)]
struct PawnEntry {
    key: u64,
    structure: i32,
    shield_mg: i32,
    valid: bool,
}

/// Pawn-structure results keyed by the pawn-and-king hash.
///
/// Power-of-two sized, one slot per index, always-replace.
#[derive(Debug, Clone)]
pub struct PawnCache {
    entries: Vec<PawnEntry>,
    mask: usize,
    hits: u64,
    misses: u64,
}

impl Default for PawnCache {
    fn default() -> Self {
        Self::with_entries(DEFAULT_PAWN_CACHE_ENTRIES)
    }
}

impl PawnCache {
    /// Rounds `entries` up to a power of two.
    pub fn with_entries(entries: usize) -> Self {
        let size = entries.max(1).next_power_of_two();
        Self {
            entries: vec![PawnEntry::default(); size],
            mask: size - 1,
            hits: 0,
            misses: 0,
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(PawnEntry::default());
        self.hits = 0;
        self.misses = 0;
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// `(structure, shield)` for the board, computing and caching on a miss.
    fn lookup(&mut self, board: &Board) -> (i32, i32) {
        let key = board.pawn_key();
        let slot = &mut self.entries[(key as usize) & self.mask];
        if slot.valid && slot.key == key {
            self.hits += 1;
            return (slot.structure, slot.shield_mg);
        }

        self.misses += 1;
        let structure = pawn_structure_score(board);
        let shield_mg = shield_score(board, Color::Light) - shield_score(board, Color::Dark);
        *slot = PawnEntry {
            key,
            structure,
            shield_mg,
            valid: true,
        };
        (structure, shield_mg)
    }
}

/// Owns the pawn cache; one per search worker.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    pawn_cache: PawnCache,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pawn_cache(pawn_cache: PawnCache) -> Self {
        Self { pawn_cache }
    }

    pub fn pawn_cache(&self) -> &PawnCache {
        &self.pawn_cache
    }

    pub fn clear(&mut self) {
        self.pawn_cache.clear();
    }

    /// Light-minus-dark score built from the selected `terms`.
    pub fn evaluate(&mut self, board: &Board, terms: EvalTerms) -> i32 {
        let phase = board.game_phase();
        let mut score = 0;

        if terms.contains(EvalTerms::MATERIAL) {
            score += board.material_score();
        }
        if terms.contains(EvalTerms::POSITIONAL) {
            score += board.positional_score();
        }

        let wants_pawns = terms.contains(EvalTerms::PAWN_STRUCTURE);
        let wants_king = terms.contains(EvalTerms::KING_SAFETY);
        if wants_pawns || wants_king {
            let (structure, shield_mg) = self.pawn_cache.lookup(board);
            if wants_pawns {
                score += structure;
            }
            if wants_king {
                let pressure = king_zone_pressure(board, Color::Light)
                    - king_zone_pressure(board, Color::Dark);
                let mg = shield_mg - pressure;
                let eg = -pressure / 2;
                score += taper(mg, eg, phase);
            }
        }

        if terms.contains(EvalTerms::MOBILITY) {
            score += mobility(board, Color::Light, phase) - mobility(board, Color::Dark, phase);
        }
        if terms.contains(EvalTerms::ROOK_ACTIVITY) {
            score += rook_activity(board);
        }
        if terms.contains(EvalTerms::BISHOP_PAIR) {
            score += bishop_pair(board);
        }

        score
    }

    /// [`Evaluator::evaluate`] from the side to move's point of view.
    #[inline]
    pub fn evaluate_relative(&mut self, board: &Board, terms: EvalTerms) -> i32 {
        board.side_to_move().sign() * self.evaluate(board, terms)
    }
}

#[inline]
fn taper(mg: i32, eg: i32, phase: i32) -> i32 {
    (mg * phase + eg * (MAX_GAME_PHASE - phase)) / MAX_GAME_PHASE
}

fn pawn_structure_score(board: &Board) -> i32 {
    let light = board.pieces(Color::Light, PieceKind::Pawn);
    let dark = board.pieces(Color::Dark, PieceKind::Pawn);
    pawn_terms_for(Color::Light, light, dark) - pawn_terms_for(Color::Dark, dark, light)
}

fn pawn_terms_for(color: Color, own: u64, enemy: u64) -> i32 {
    let mut score = 0;

    for file_mask in FILE_MASKS {
        let on_file = popcount(own & file_mask) as i32;
        if on_file > 1 {
            score += DOUBLED_PAWN_PENALTY * (on_file - 1);
        }
    }

    for square in Squares(own) {
        if own & adjacent_files(file_of(square)) == 0 {
            score += ISOLATED_PAWN_PENALTY;
        }
        if enemy & PASSED_PAWN_MASKS[color.index()][square as usize] == 0 {
            score += PASSED_PAWN_BONUS[relative_rank(color, square) as usize];
        }
    }

    score
}

fn shield_score(board: &Board, color: Color) -> i32 {
    let king_sq = board.king_square(color) as usize;
    let shield = KING_SHIELD_MASKS[color.index()][king_sq] & board.pieces(color, PieceKind::Pawn);
    popcount(shield) as i32 * PAWN_SHIELD_BONUS
}

#[inline]
fn king_distance(a: Square, b: Square) -> i32 {
    let file_diff = (file_of(a) as i32 - file_of(b) as i32).abs();
    let rank_diff = (rank_of(a) as i32 - rank_of(b) as i32).abs();
    file_diff.max(rank_diff)
}

/// Weighted enemy presence around `color`'s king; closer pieces count more.
fn king_zone_pressure(board: &Board, color: Color) -> i32 {
    let king_sq = board.king_square(color);
    let zone = KING_ZONE[king_sq as usize];
    let enemy = color.opposite();

    let mut pressure = 0;
    for piece in PieceKind::ALL {
        let weight = ATTACKER_WEIGHTS[piece.index()];
        if weight == 0 {
            continue;
        }
        for square in Squares(board.pieces(enemy, piece) & zone) {
            let closeness = (3 - king_distance(king_sq, square)).max(0);
            pressure += (weight * closeness) >> 1;
        }
    }
    pressure
}

fn mobility(board: &Board, color: Color, phase: i32) -> i32 {
    let occupancy = board.occupancy();
    let free = !board.color_occupancy(color);
    let rook_weight = (2 * phase + 4 * (MAX_GAME_PHASE - phase)) / MAX_GAME_PHASE;
    let queen_weight = (phase + 2 * (MAX_GAME_PHASE - phase)) / MAX_GAME_PHASE;

    let mut score = 0;
    for sq in Squares(board.pieces(color, PieceKind::Knight)) {
        score += popcount(knight_attacks(sq) & free) as i32 * KNIGHT_MOBILITY;
    }
    for sq in Squares(board.pieces(color, PieceKind::Bishop)) {
        score += popcount(bishop_attacks(sq, occupancy) & free) as i32 * BISHOP_MOBILITY;
    }
    for sq in Squares(board.pieces(color, PieceKind::Rook)) {
        score += popcount(rook_attacks(sq, occupancy) & free) as i32 * rook_weight;
    }
    for sq in Squares(board.pieces(color, PieceKind::Queen)) {
        score += popcount(queen_attacks(sq, occupancy) & free) as i32 * queen_weight;
    }
    score
}

fn rook_activity(board: &Board) -> i32 {
    let light_pawns = board.pieces(Color::Light, PieceKind::Pawn);
    let dark_pawns = board.pieces(Color::Dark, PieceKind::Pawn);
    let light_rooks = board.pieces(Color::Light, PieceKind::Rook);
    let dark_rooks = board.pieces(Color::Dark, PieceKind::Rook);

    let mut score = popcount(light_rooks & RANK_MASKS[6]) as i32 * ROOK_ON_SEVENTH_BONUS
        - popcount(dark_rooks & RANK_MASKS[1]) as i32 * ROOK_ON_SEVENTH_BONUS;

    for file in FILE_MASKS {
        let light_open = light_pawns & file == 0;
        let dark_open = dark_pawns & file == 0;
        if light_open {
            let bonus = if dark_open { OPEN_FILE_BONUS } else { SEMI_OPEN_FILE_BONUS };
            score += popcount(light_rooks & file) as i32 * bonus;
        }
        if dark_open {
            let bonus = if light_open { OPEN_FILE_BONUS } else { SEMI_OPEN_FILE_BONUS };
            score -= popcount(dark_rooks & file) as i32 * bonus;
        }
    }
    score
}

fn bishop_pair(board: &Board) -> i32 {
    let light = popcount(board.pieces(Color::Light, PieceKind::Bishop)) >= 2;
    let dark = popcount(board.pieces(Color::Dark, PieceKind::Bishop)) >= 2;
    BISHOP_PAIR_BONUS * (i32::from(light) - i32::from(dark))
}
