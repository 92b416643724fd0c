//! Crate root module declarations for the Bramble Chess search core.
//!
//! Exposes the board and move generation, the search (evaluation,
//! transposition table, negamax, Lazy SMP driver) and the engine facade the
//! UCI loop talks to, so binaries, benches and external tooling can import
//! stable module paths.

pub mod errors;

pub mod game_state {
    pub mod board;
    pub mod board_snapshot;
    pub mod chess_rules;
    pub mod chess_types;
    pub mod make_move;
    pub mod piece_square_tables;
    pub mod repetition;
}

pub mod moves {
    pub mod bit_utils;
    pub mod king_moves;
    pub mod knight_moves;
    pub mod move_descriptions;
    pub mod pawn_moves;
    pub mod ray_masks;
    pub mod slider_moves;
}

pub mod move_generation {
    pub mod legal_move_checks;
    pub mod legal_move_generator;
    pub mod legal_moves_king;
    pub mod legal_moves_pawn;
    pub mod legal_moves_pieces;
    pub mod perft;
    pub mod static_exchange;
}

pub mod search {
    pub mod aspiration;
    pub mod board_scoring;
    pub mod iterative_deepening;
    pub mod move_ordering;
    pub mod negamax;
    pub mod quiescence;
    pub mod search_context;
    pub mod threading;
    pub mod transposition_table;
    pub mod zobrist;
}

pub mod engines {
    pub mod engine;
    pub mod search_limits;
    pub mod time_management;
}

pub mod utils {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod long_algebraic;
}
