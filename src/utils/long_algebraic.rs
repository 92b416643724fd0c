//! Coordinate move notation (`e2e4`, `e7e8q`).
//!
//! Formatting lives on `Move`'s `Display`; parsing matches the text against
//! the legal moves of a position so every flag comes from the live board.

use crate::errors::MoveParseError;
use crate::game_state::{board::Board, chess_types::PieceKind};
use crate::move_generation::legal_move_generator::generate_moves;
use crate::moves::move_descriptions::Move;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_long_algebraic(board: &Board, text: &str) -> Result<Move, MoveParseError> {
    if !(4..=5).contains(&text.len()) || !text.is_ascii() {
        return Err(MoveParseError::Length(text.to_owned()));
    }

    let from = algebraic_to_square(&text[0..2])?;
    let to = algebraic_to_square(&text[2..4])?;
    let promotion = match text[4..].chars().next() {
        None => None,
        Some(ch @ ('q' | 'r' | 'b' | 'n')) => PieceKind::from_char(ch),
        Some(_) => return Err(MoveParseError::Promotion(text.to_owned())),
    };

    generate_moves(board, false)
        .into_iter()
        .find(|mv| mv.from == from && mv.to == to && mv.promotion_piece == promotion)
        .ok_or_else(|| MoveParseError::NotLegal(text.to_owned()))
}

pub fn move_to_long_algebraic(mv: &Move) -> String {
    mv.to_string()
}
