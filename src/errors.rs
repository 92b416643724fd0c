//! Error types surfaced at the crate boundary.
//!
//! Only malformed input is an error here. Search timeouts are ordinary
//! control flow and never show up as an `Err`.

use thiserror::Error;

/// Failure while reading a Forsyth-Edwards Notation string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("FEN must have exactly 6 fields, found {0}")]
    FieldCount(usize),
    #[error("board layout must contain 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} does not sum to 8 files")]
    RankWidth { rank: usize },
    #[error("invalid piece character '{0}' in board layout")]
    PieceChar(char),
    #[error("invalid side-to-move field: {0}")]
    SideToMove(String),
    #[error("invalid castling rights character: {0}")]
    CastlingChar(char),
    #[error("invalid en-passant square: {0}")]
    EnPassant(#[from] SquareParseError),
    #[error("en-passant square {0} does not follow a double pawn push")]
    EnPassantUnreachable(String),
    #[error("invalid {field}: {value}")]
    Counter { field: &'static str, value: String },
    #[error("each side needs exactly one king")]
    KingCount,
}

/// Failure while reading an algebraic square such as `e4`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid algebraic square: {0}")]
pub struct SquareParseError(pub String);

/// Failure while reading a coordinate move such as `e7e8q`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("move text must be 4 or 5 characters: {0}")]
    Length(String),
    #[error(transparent)]
    Square(#[from] SquareParseError),
    #[error("invalid promotion piece in move: {0}")]
    Promotion(String),
    #[error("no legal move matches {0}")]
    NotLegal(String),
}
