//! Copyable position state and the undo stack that stores it.
//!
//! Undo restores a whole [`PositionState`] instead of reversing each field.
//! The stack keeps its slots after a pop so deep searches reuse memory
//! instead of allocating per move.

use crate::game_state::chess_types::*;
use crate::moves::move_descriptions::Move;

/// Every field `make_move` touches, kept together so one copy saves it all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionState {
    pub pieces: [[u64; 6]; 2],
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,
    pub king_squares: [Square; 2],
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    /// Plies since the last null move; saturates at `u16::MAX` when there
    /// is none on the path.
    pub plies_from_null: u16,
    pub zobrist_key: u64,
    pub pawn_zobrist_key: u64,
    /// Light minus dark, kings included (they cancel).
    pub material_score: i32,
    /// Light minus dark piece-square sums, middlegame weights.
    pub positional_mg: i32,
    /// Light minus dark piece-square sums, endgame weights.
    pub positional_eg: i32,
    /// Sum of phase weights over all pieces on the board.
    pub game_phase: i32,
}

impl PositionState {
    pub const fn empty() -> Self {
        Self {
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,
            side_to_move: Color::Light,
            castling_rights: 0,
            en_passant_square: None,
            king_squares: [0; 2],
            halfmove_clock: 0,
            fullmove_number: 1,
            plies_from_null: u16::MAX,
            zobrist_key: 0,
            pawn_zobrist_key: 0,
            material_score: 0,
            positional_mg: 0,
            positional_eg: 0,
            game_phase: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub state: PositionState,
    pub mv: Move,
}

/// Arena-style stack of snapshots addressed by index.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStack {
    slots: Vec<Snapshot>,
    len: usize,
}

impl SnapshotStack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, state: PositionState, mv: Move) {
        let snapshot = Snapshot { state, mv };
        if self.len < self.slots.len() {
            self.slots[self.len] = snapshot;
        } else {
            self.slots.push(snapshot);
        }
        self.len += 1;
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Snapshot> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.slots[self.len])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}
