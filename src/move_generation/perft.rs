use crate::game_state::board::Board;
use crate::move_generation::legal_move_generator::generate_moves;
use crate::moves::move_descriptions::Move;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.checkmates += rhs.checkmates;
    }
}

/// Leaf count at `depth`, using make/undo on the given board.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_moves(board, false);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        board.make_move(mv);
        nodes += perft(board, depth - 1);
        board.undo_move(mv);
    }
    nodes
}

/// Leaf count below each root move, in generation order.
pub fn perft_divide(board: &mut Board, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }

    generate_moves(board, false)
        .into_iter()
        .map(|mv| {
            board.make_move(mv);
            let nodes = perft(board, depth - 1);
            board.undo_move(mv);
            (mv, nodes)
        })
        .collect()
}

/// Leaf count plus per-leaf move categories (the usual perft table columns).
pub fn perft_detailed(board: &mut Board, depth: u32) -> PerftCounts {
    let mut counts = PerftCounts::default();
    if depth == 0 {
        counts.nodes = 1;
        return counts;
    }

    for mv in generate_moves(board, false) {
        board.make_move(mv);
        if depth == 1 {
            counts.merge(classify_leaf(board, &mv));
        } else {
            counts.merge(perft_detailed(board, depth - 1));
        }
        board.undo_move(mv);
    }
    counts
}

fn classify_leaf(board_after: &Board, mv: &Move) -> PerftCounts {
    let gives_check = board_after.in_check();
    PerftCounts {
        nodes: 1,
        captures: u64::from(mv.is_capture()),
        en_passant: u64::from(mv.is_en_passant),
        castles: u64::from(mv.is_castle),
        promotions: u64::from(mv.is_promotion()),
        checks: u64::from(gives_check),
        checkmates: u64::from(gives_check && generate_moves(board_after, false).is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;

    const KIWIPETE_FEN: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_3_FEN: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    const POSITION_4_FEN: &str =
        "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1";
    const POSITION_5_FEN: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    fn assert_perft(fen: &str, expected: &[u64]) {
        let mut board = Board::from_fen(fen).expect("perft FEN should parse");
        let before = board.clone();
        for (idx, nodes) in expected.iter().enumerate() {
            let depth = idx as u32 + 1;
            assert_eq!(perft(&mut board, depth), *nodes, "{fen} depth {depth}");
        }
        assert!(board.same_position(&before));
        assert_eq!(board.hash(), board.recompute_hash());
    }

    #[test]
    fn perft_starting_position() {
        assert_perft(STARTING_POSITION_FEN, &[20, 400, 8902]);
    }

    #[test]
    fn perft_kiwipete() {
        assert_perft(KIWIPETE_FEN, &[48, 2039]);
    }

    #[test]
    fn perft_position_3() {
        assert_perft(POSITION_3_FEN, &[14, 191, 2812]);
    }

    #[test]
    fn perft_position_4() {
        assert_perft(POSITION_4_FEN, &[6, 264, 9467]);
    }

    #[test]
    fn perft_position_5() {
        assert_perft(POSITION_5_FEN, &[44, 1486]);
    }

    #[test]
    #[ignore = "deep perft, run with --ignored in release"]
    fn perft_deep_reference_counts() {
        assert_perft(STARTING_POSITION_FEN, &[20, 400, 8902, 197_281, 4_865_609]);
        assert_perft(KIWIPETE_FEN, &[48, 2039, 97_862, 4_085_603]);
        assert_perft(POSITION_3_FEN, &[14, 191, 2812, 43_238, 674_624]);
        assert_perft(POSITION_4_FEN, &[6, 264, 9467, 422_333]);
        assert_perft(POSITION_5_FEN, &[44, 1486, 62_379, 2_103_487]);
    }

    #[test]
    fn detailed_counts_match_published_kiwipete_columns() {
        let mut board = Board::from_fen(KIWIPETE_FEN).expect("perft FEN should parse");
        let counts = perft_detailed(&mut board, 2);
        assert_eq!(
            counts,
            PerftCounts {
                nodes: 2039,
                captures: 351,
                en_passant: 1,
                castles: 91,
                promotions: 0,
                checks: 3,
                checkmates: 0,
            }
        );
    }

    #[test]
    fn divide_sums_to_perft() {
        let mut board = Board::new_game();
        let divided = perft_divide(&mut board, 3);
        assert_eq!(divided.len(), 20);
        assert_eq!(divided.iter().map(|(_, n)| n).sum::<u64>(), 8902);
    }
}
