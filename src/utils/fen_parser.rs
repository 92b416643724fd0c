//! FEN-to-Board parser.
//!
//! Builds a fully-populated position from a Forsyth-Edwards Notation string,
//! including piece bitboards, rights, clocks and the incremental scores.

use crate::errors::FenError;
use crate::game_state::{board::Board, chess_types::*};
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    let [board_part, side_part, castling_part, en_passant_part, halfmove_part, fullmove_part] =
        parts[..]
    else {
        return Err(FenError::FieldCount(parts.len()));
    };

    let mut board = Board::new_empty();

    parse_board(board_part, &mut board)?;
    board.state.side_to_move = parse_side_to_move(side_part)?;
    board.state.castling_rights = parse_castling_rights(castling_part)?;
    board.state.en_passant_square = parse_en_passant_square(en_passant_part)?;
    if let Some(ep) = board.state.en_passant_square {
        validate_en_passant_square(&board, ep, en_passant_part)?;
    }
    board.state.halfmove_clock = parse_counter("halfmove clock", halfmove_part)?;
    board.state.fullmove_number = parse_counter("fullmove number", fullmove_part)?;

    board.finish_setup()?;
    Ok(board)
}

fn parse_board(board_part: &str, board: &mut Board) -> Result<(), FenError> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount(ranks.len()));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - fen_rank_idx;
        let mut file = 0usize;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(FenError::PieceChar(ch));
                }
                file += empty_count as usize;
                continue;
            }

            let (color, piece) = piece_from_fen_char(ch).ok_or(FenError::PieceChar(ch))?;

            if file >= 8 {
                return Err(FenError::RankWidth { rank: board_rank + 1 });
            }

            board.place_piece(color, piece, (board_rank * 8 + file) as Square);
            file += 1;
        }

        if file != 8 {
            return Err(FenError::RankWidth { rank: board_rank + 1 });
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> Result<Color, FenError> {
    match side_part {
        "w" => Ok(Color::Light),
        "b" => Ok(Color::Dark),
        _ => Err(FenError::SideToMove(side_part.to_owned())),
    }
}

fn parse_castling_rights(castling_part: &str) -> Result<CastlingRights, FenError> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;

    for ch in castling_part.chars() {
        match ch {
            'K' => rights |= CASTLE_LIGHT_KINGSIDE,
            'Q' => rights |= CASTLE_LIGHT_QUEENSIDE,
            'k' => rights |= CASTLE_DARK_KINGSIDE,
            'q' => rights |= CASTLE_DARK_QUEENSIDE,
            _ => return Err(FenError::CastlingChar(ch)),
        }
    }

    Ok(rights)
}

fn parse_en_passant_square(en_passant_part: &str) -> Result<Option<Square>, FenError> {
    if en_passant_part == "-" {
        return Ok(None);
    }

    Ok(Some(algebraic_to_square(en_passant_part)?))
}

/// The square must lie behind an enemy pawn that just advanced two ranks:
/// rank 6 with light to move, rank 3 with dark to move, with the square and
/// the pawn's origin both empty.
fn validate_en_passant_square(board: &Board, ep: Square, text: &str) -> Result<(), FenError> {
    let us = board.side_to_move();
    let them = us.opposite();
    let (ep_rank, pushed, origin) = match us {
        Color::Light => (5, ep.wrapping_sub(8), ep + 8),
        Color::Dark => (2, ep + 8, ep.wrapping_sub(8)),
    };
    let reachable = ep / 8 == ep_rank
        && board.piece_on(pushed) == Some((them, PieceKind::Pawn))
        && board.piece_on(ep).is_none()
        && board.piece_on(origin).is_none();
    if reachable {
        Ok(())
    } else {
        Err(FenError::EnPassantUnreachable(text.to_owned()))
    }
}

fn parse_counter(field: &'static str, value: &str) -> Result<u16, FenError> {
    value.parse::<u16>().map_err(|_| FenError::Counter {
        field,
        value: value.to_owned(),
    })
}

fn piece_from_fen_char(ch: char) -> Option<(Color, PieceKind)> {
    let color = if ch.is_ascii_uppercase() {
        Color::Light
    } else if ch.is_ascii_lowercase() {
        Color::Dark
    } else {
        return None;
    };

    PieceKind::from_char(ch).map(|piece| (color, piece))
}
