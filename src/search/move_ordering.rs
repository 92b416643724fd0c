//! Staged move ordering and the per-worker heuristics that feed it.
//!
//! Every move gets `stage * STAGE_WEIGHT + tiebreak`, and [`MovePicker`]
//! selects the best remaining entry lazily: most cutoffs come from the first
//! few moves, so a full sort is wasted work.

use rand::rngs::StdRng;
use rand::Rng;

use crate::game_state::board::Board;
use crate::game_state::chess_rules::piece_value;
use crate::game_state::chess_types::{relative_rank, Color, PieceKind};
use crate::game_state::piece_square_tables::pst_bonus;
use crate::move_generation::static_exchange::see_move;
use crate::moves::move_descriptions::Move;
use crate::search::search_context::MAX_PLY;

pub const STAGE_WEIGHT: i32 = 100_000;

pub const STAGE_TT_MOVE: i32 = 6;
pub const STAGE_PROMOTION: i32 = 5;
pub const STAGE_GOOD_CAPTURE: i32 = 4;
pub const STAGE_KILLER: i32 = 3;
pub const STAGE_QUIET: i32 = 2;
pub const STAGE_LOSING_CAPTURE: i32 = 1;

pub const HISTORY_CAP: i32 = 50_000;
const PAWN_PUSH_BONUS: i32 = 40;
const ROOT_JITTER: i32 = STAGE_WEIGHT / 4;

pub type HistoryTable = [[[i32; 64]; 6]; 2];

/// Killer moves per ply and the butterfly history table.
#[derive(Debug, Clone)]
pub struct OrderingHeuristics {
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: HistoryTable,
}

impl Default for OrderingHeuristics {
    fn default() -> Self {
        Self {
            killers: [[None; 2]; MAX_PLY],
            history: [[[0; 64]; 6]; 2],
        }
    }
}

impl OrderingHeuristics {
    pub fn clear(&mut self) {
        self.killers.fill([None; 2]);
        self.history = [[[0; 64]; 6]; 2];
    }

    /// Forget killers and halve history between searches.
    pub fn age(&mut self) {
        self.killers.fill([None; 2]);
        for side in self.history.iter_mut() {
            for piece in side.iter_mut() {
                for value in piece.iter_mut() {
                    *value /= 2;
                }
            }
        }
    }

    #[inline]
    pub fn killers_at(&self, ply: usize) -> [Option<Move>; 2] {
        self.killers.get(ply).copied().unwrap_or([None; 2])
    }

    #[inline]
    pub fn is_killer(&self, ply: usize, mv: &Move) -> bool {
        self.killers_at(ply).iter().flatten().any(|k| k == mv)
    }

    pub fn record_killer(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.killers.get_mut(ply) else {
            return;
        };
        if slot[0] == Some(mv) {
            return;
        }
        slot[1] = slot[0];
        slot[0] = Some(mv);
    }

    pub fn record_history(&mut self, side: Color, mv: &Move, depth: i32) {
        let bonus = depth.max(1) * depth.max(1);
        let entry = &mut self.history[side.index()][mv.moved_piece.index()][usize::from(mv.to)];
        *entry = (*entry + bonus).min(HISTORY_CAP);
    }

    #[inline]
    pub fn history_score(&self, side: Color, mv: &Move) -> i32 {
        self.history[side.index()][mv.moved_piece.index()][usize::from(mv.to)]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredMove {
    pub mv: Move,
    pub stage: i32,
    pub score: i32,
    /// Exchange value for captures and promotions, zero otherwise.
    pub see: i32,
}

/// Ordering score and SEE for one move.
pub fn score_move(
    board: &Board,
    mv: &Move,
    tt_move: Option<&Move>,
    killers: &[Option<Move>; 2],
    heuristics: &OrderingHeuristics,
) -> ScoredMove {
    let tactical = mv.is_capture() || mv.is_promotion();
    let see = if tactical { see_move(board, mv) } else { 0 };

    let (stage, tiebreak) = if tt_move == Some(mv) {
        (STAGE_TT_MOVE, 0)
    } else if let Some(promo) = mv.promotion_piece {
        if see < 0 {
            (STAGE_LOSING_CAPTURE, see)
        } else {
            (STAGE_PROMOTION, piece_value(promo) + see)
        }
    } else if let Some(victim) = mv.captured_piece {
        if see < 0 {
            (STAGE_LOSING_CAPTURE, see)
        } else {
            (STAGE_GOOD_CAPTURE, see + piece_value(victim))
        }
    } else if killers[0] == Some(*mv) {
        (STAGE_KILLER, 1)
    } else if killers[1] == Some(*mv) {
        (STAGE_KILLER, 0)
    } else {
        (STAGE_QUIET, quiet_tiebreak(mv, heuristics))
    };

    ScoredMove {
        mv: *mv,
        stage,
        score: stage * STAGE_WEIGHT + tiebreak.clamp(-STAGE_WEIGHT / 2, STAGE_WEIGHT / 2),
        see,
    }
}

fn quiet_tiebreak(mv: &Move, heuristics: &OrderingHeuristics) -> i32 {
    let (from_mg, _) = pst_bonus(mv.color, mv.moved_piece, mv.from);
    let (to_mg, _) = pst_bonus(mv.color, mv.moved_piece, mv.to);
    let mut score = heuristics.history_score(mv.color, mv) + (to_mg - from_mg);
    if mv.moved_piece == PieceKind::Pawn {
        let rank = i32::from(relative_rank(mv.color, mv.to));
        score += (rank - 4).max(0) * PAWN_PUSH_BONUS;
    }
    score
}

/// Hands out moves best-first by selection over the remaining entries.
#[derive(Debug, Clone)]
pub struct MovePicker {
    moves: Vec<ScoredMove>,
    cursor: usize,
}

impl MovePicker {
    pub fn new(
        board: &Board,
        moves: &[Move],
        tt_move: Option<&Move>,
        killers: &[Option<Move>; 2],
        heuristics: &OrderingHeuristics,
    ) -> Self {
        Self {
            moves: moves
                .iter()
                .map(|mv| score_move(board, mv, tt_move, killers, heuristics))
                .collect(),
            cursor: 0,
        }
    }

    /// Shuffle moves inside their stage; the TT move stays first.
    pub fn perturb(&mut self, rng: &mut StdRng) {
        for entry in self.moves[self.cursor..].iter_mut() {
            if entry.stage != STAGE_TT_MOVE {
                entry.score += rng.random_range(0..ROOT_JITTER);
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Iterator for MovePicker {
    type Item = ScoredMove;

    fn next(&mut self) -> Option<ScoredMove> {
        let remaining = self.moves.get(self.cursor..)?;
        let best = remaining
            .iter()
            .enumerate()
            .max_by_key(|(idx, entry)| (entry.score, std::cmp::Reverse(*idx)))
            .map(|(idx, _)| idx)?;
        self.moves.swap(self.cursor, self.cursor + best);
        self.cursor += 1;
        Some(self.moves[self.cursor - 1])
    }
}
