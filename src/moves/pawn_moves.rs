//! Pawn attack tables plus the pawn-structure masks evaluation relies on.

use crate::game_state::chess_types::Color;
use crate::moves::bit_utils::adjacent_files;

pub const LIGHT_PAWN_ATTACKS: [u64; 64] = generate_pawn_attacks(Color::Light);
pub const DARK_PAWN_ATTACKS: [u64; 64] = generate_pawn_attacks(Color::Dark);

/// Squares in front of a pawn on its own and adjacent files. An enemy pawn
/// anywhere in this mask stops the pawn from being passed.
pub const PASSED_PAWN_MASKS: [[u64; 64]; 2] = [
    generate_passed_masks(Color::Light),
    generate_passed_masks(Color::Dark),
];

/// The three squares directly in front of the king, one and two ranks up.
pub const KING_SHIELD_MASKS: [[u64; 64]; 2] = [
    generate_shield_masks(Color::Light),
    generate_shield_masks(Color::Dark),
];

#[inline]
pub const fn pawn_attacks(color: Color, square: u8) -> u64 {
    match color {
        Color::Light => LIGHT_PAWN_ATTACKS[square as usize],
        Color::Dark => DARK_PAWN_ATTACKS[square as usize],
    }
}

/// Squares attacked by every pawn in `pawns` at once.
#[inline]
pub const fn pawn_attack_span(color: Color, pawns: u64) -> u64 {
    const NOT_A: u64 = !0x0101_0101_0101_0101;
    const NOT_H: u64 = !0x8080_8080_8080_8080;
    match color {
        Color::Light => ((pawns & NOT_A) << 7) | ((pawns & NOT_H) << 9),
        Color::Dark => ((pawns & NOT_A) >> 9) | ((pawns & NOT_H) >> 7),
    }
}

const fn generate_pawn_attacks(color: Color) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = sq % 8;
        let rank = sq / 8;
        let mut attacks = 0u64;

        match color {
            Color::Light => {
                if rank < 7 {
                    if file > 0 {
                        attacks |= 1u64 << (sq + 7);
                    }
                    if file < 7 {
                        attacks |= 1u64 << (sq + 9);
                    }
                }
            }
            Color::Dark => {
                if rank > 0 {
                    if file > 0 {
                        attacks |= 1u64 << (sq - 9);
                    }
                    if file < 7 {
                        attacks |= 1u64 << (sq - 7);
                    }
                }
            }
        }

        table[sq] = attacks;
        sq += 1;
    }

    table
}

const fn generate_passed_masks(color: Color) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as u8;
        let rank = sq / 8;
        let files = adjacent_files(file) | (0x0101_0101_0101_0101u64 << file);
        let mut ahead = 0u64;
        let mut r = 0usize;

        while r < 8 {
            let in_front = match color {
                Color::Light => r > rank,
                Color::Dark => r < rank,
            };
            if in_front {
                ahead |= 0xFFu64 << (r * 8);
            }
            r += 1;
        }

        table[sq] = files & ahead;
        sq += 1;
    }

    table
}

const fn generate_shield_masks(color: Color) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as u8;
        let rank = (sq / 8) as i32;
        let files = adjacent_files(file) | (0x0101_0101_0101_0101u64 << file);
        let (r1, r2) = match color {
            Color::Light => (rank + 1, rank + 2),
            Color::Dark => (rank - 1, rank - 2),
        };
        let mut ranks = 0u64;
        if r1 >= 0 && r1 < 8 {
            ranks |= 0xFFu64 << (r1 * 8);
        }
        if r2 >= 0 && r2 < 8 {
            ranks |= 0xFFu64 << (r2 * 8);
        }

        table[sq] = files & ranks;
        sq += 1;
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_pawn_attacks_from_e2() {
        let e2 = 12u8;
        let expected = (1u64 << 19) | (1u64 << 21);
        assert_eq!(LIGHT_PAWN_ATTACKS[e2 as usize], expected);
        assert_eq!(pawn_attacks(Color::Light, e2), expected);
    }

    #[test]
    fn dark_pawn_attacks_from_e7() {
        let e7 = 52u8;
        let expected = (1u64 << 43) | (1u64 << 45);
        assert_eq!(DARK_PAWN_ATTACKS[e7 as usize], expected);
    }

    #[test]
    fn attack_span_matches_table_union() {
        let pawns = (1u64 << 8) | (1u64 << 12) | (1u64 << 15);
        let union = LIGHT_PAWN_ATTACKS[8] | LIGHT_PAWN_ATTACKS[12] | LIGHT_PAWN_ATTACKS[15];
        assert_eq!(pawn_attack_span(Color::Light, pawns), union);
    }

    #[test]
    fn passed_mask_for_e4_covers_three_files_ahead() {
        let e4 = 28usize;
        assert_eq!(PASSED_PAWN_MASKS[0][e4].count_ones(), 12);
        assert_eq!(PASSED_PAWN_MASKS[1][e4].count_ones(), 9);
    }
}
