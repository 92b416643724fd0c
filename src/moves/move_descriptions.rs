//! Move descriptor and its compact 16-bit transposition encoding.
//!
//! A [`Move`] carries everything make/undo needs. Equality only looks at
//! `(from, to, promotion)`, so a move recovered from a [`PackedMove`] matches
//! the freshly generated move it came from.

use std::fmt;

use crate::game_state::chess_types::{Color, PieceKind, Square};

#[derive(Debug, Clone, Copy)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub moved_piece: PieceKind,
    pub captured_piece: Option<PieceKind>,
    pub promotion_piece: Option<PieceKind>,
    pub color: Color,
    pub is_castle: bool,
    pub is_en_passant: bool,
}

impl Move {
    /// Plain move without captures or special flags.
    #[inline]
    pub const fn quiet(from: Square, to: Square, moved_piece: PieceKind, color: Color) -> Self {
        Self {
            from,
            to,
            moved_piece,
            captured_piece: None,
            promotion_piece: None,
            color,
            is_castle: false,
            is_en_passant: false,
        }
    }

    #[inline]
    pub const fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }

    #[inline]
    pub const fn is_promotion(&self) -> bool {
        self.promotion_piece.is_some()
    }

    /// Neither a capture nor a promotion.
    #[inline]
    pub const fn is_quiet(&self) -> bool {
        !self.is_capture() && !self.is_promotion()
    }

    #[inline]
    pub fn pack(&self) -> PackedMove {
        PackedMove::new(self.from, self.to, self.promotion_piece)
    }
}

impl PartialEq for Move {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.promotion_piece == other.promotion_piece
    }
}

impl Eq for Move {}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_square(f, self.from)?;
        write_square(f, self.to)?;
        if let Some(promo) = self.promotion_piece {
            write!(f, "{}", promo.to_char())?;
        }
        Ok(())
    }
}

fn write_square(f: &mut fmt::Formatter<'_>, square: Square) -> fmt::Result {
    write!(
        f,
        "{}{}",
        char::from(b'a' + square % 8),
        char::from(b'1' + square / 8)
    )
}

const FROM_SHIFT: u16 = 0;
const TO_SHIFT: u16 = 6;
const PROMOTION_SHIFT: u16 = 12;

const SQUARE_MASK: u16 = 0x3F;
const PROMOTION_MASK: u16 = 0x7;

/// `from | to << 6 | promotion << 12`, promotion code 0 meaning none.
///
/// The all-zero word (`a1a1`) can never be a real move and marks "no move".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PackedMove(pub u16);

impl PackedMove {
    pub const NONE: PackedMove = PackedMove(0);

    #[inline]
    pub fn new(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        let mut bits = 0u16;
        bits |= (u16::from(from) & SQUARE_MASK) << FROM_SHIFT;
        bits |= (u16::from(to) & SQUARE_MASK) << TO_SHIFT;
        bits |= promotion_to_code(promotion) << PROMOTION_SHIFT;
        PackedMove(bits)
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn from_square(self) -> Square {
        ((self.0 >> FROM_SHIFT) & SQUARE_MASK) as Square
    }

    #[inline]
    pub const fn to_square(self) -> Square {
        ((self.0 >> TO_SHIFT) & SQUARE_MASK) as Square
    }

    #[inline]
    pub fn promotion(self) -> Option<PieceKind> {
        promotion_from_code((self.0 >> PROMOTION_SHIFT) & PROMOTION_MASK)
    }

    /// True when this encodes the same `(from, to, promotion)` as `mv`.
    #[inline]
    pub fn matches(self, mv: &Move) -> bool {
        !self.is_none() && self == mv.pack()
    }
}

#[inline]
fn promotion_to_code(piece: Option<PieceKind>) -> u16 {
    match piece {
        None => 0,
        Some(PieceKind::Knight) => 1,
        Some(PieceKind::Bishop) => 2,
        Some(PieceKind::Rook) => 3,
        Some(PieceKind::Queen) => 4,
        Some(PieceKind::Pawn) | Some(PieceKind::King) => 0,
    }
}

#[inline]
fn promotion_from_code(code: u16) -> Option<PieceKind> {
    match code {
        1 => Some(PieceKind::Knight),
        2 => Some(PieceKind::Bishop),
        3 => Some(PieceKind::Rook),
        4 => Some(PieceKind::Queen),
        _ => None,
    }
}
