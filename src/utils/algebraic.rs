//! Square conversions for algebraic coordinates such as `e4`.

use crate::errors::SquareParseError;
use crate::game_state::chess_types::Square;

/// Convert algebraic notation (for example: "e4") to a square index.
#[inline]
pub fn algebraic_to_square(square: &str) -> Result<Square, SquareParseError> {
    let bytes = square.as_bytes();
    let [file, rank] = bytes else {
        return Err(SquareParseError(square.to_owned()));
    };

    if !(b'a'..=b'h').contains(file) || !(b'1'..=b'8').contains(rank) {
        return Err(SquareParseError(square.to_owned()));
    }

    Ok((rank - b'1') * 8 + (file - b'a'))
}

/// Convert a square index (`0..=63`) to algebraic notation (for example: "e4").
#[inline]
pub fn square_to_algebraic(square: Square) -> String {
    let file_char = char::from(b'a' + square % 8);
    let rank_char = char::from(b'1' + square / 8);
    format!("{file_char}{rank_char}")
}
