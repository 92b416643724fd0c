//! Knight attack table, built at compile time.

pub const KNIGHT_ATTACKS: [u64; 64] = generate_knight_attacks();

#[inline]
pub const fn knight_attacks(square: u8) -> u64 {
    KNIGHT_ATTACKS[square as usize]
}

const KNIGHT_JUMPS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const fn generate_knight_attacks() -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut attacks = 0u64;
        let mut i = 0usize;

        while i < KNIGHT_JUMPS.len() {
            attacks |= square_if_on_board(file + KNIGHT_JUMPS[i].0, rank + KNIGHT_JUMPS[i].1);
            i += 1;
        }

        table[sq] = attacks;
        sq += 1;
    }

    table
}

/// One-hot mask for `(file, rank)`, or empty when off the board.
pub(crate) const fn square_if_on_board(file: i32, rank: i32) -> u64 {
    if file < 0 || file > 7 || rank < 0 || rank > 7 {
        return 0;
    }
    1u64 << ((rank as usize) * 8 + (file as usize))
}

#[cfg(test)]
mod tests {
    use super::{knight_attacks, KNIGHT_ATTACKS};

    #[test]
    fn knight_attacks_from_d4_has_eight_targets() {
        let d4 = 27u8;
        assert_eq!(KNIGHT_ATTACKS[d4 as usize].count_ones(), 8);
    }

    #[test]
    fn knight_in_corner_has_two_targets() {
        let h8 = 63u8;
        let expected = (1u64 << 46) | (1u64 << 53);
        assert_eq!(knight_attacks(h8), expected);
    }
}
