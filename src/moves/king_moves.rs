//! King attack table and king-zone masks used by evaluation and ordering.

use crate::moves::knight_moves::square_if_on_board;

pub const KING_ATTACKS: [u64; 64] = generate_king_attacks();

/// King square plus its neighbours plus the two ranks in front of it for
/// either side. Used to weigh attackers near the king.
pub const KING_ZONE: [u64; 64] = generate_king_zone();

#[inline]
pub const fn king_attacks(square: u8) -> u64 {
    KING_ATTACKS[square as usize]
}

const fn generate_king_attacks() -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut attacks = 0u64;
        let mut df = -1;

        while df <= 1 {
            let mut dr = -1;
            while dr <= 1 {
                if df != 0 || dr != 0 {
                    attacks |= square_if_on_board(file + df, rank + dr);
                }
                dr += 1;
            }
            df += 1;
        }

        table[sq] = attacks;
        sq += 1;
    }

    table
}

const fn generate_king_zone() -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut zone = 0u64;
        let mut df = -1;

        while df <= 1 {
            let mut dr = -2;
            while dr <= 2 {
                zone |= square_if_on_board(file + df, rank + dr);
                dr += 1;
            }
            df += 1;
        }

        table[sq] = zone;
        sq += 1;
    }

    table
}
