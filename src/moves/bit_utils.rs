//! Bit-scan and mask helpers over 64-bit square sets.

use crate::game_state::chess_types::Square;

pub const FILE_A: u64 = 0x0101_0101_0101_0101;
pub const RANK_1: u64 = 0xFF;

/// File masks `a..h`.
pub const FILE_MASKS: [u64; 8] = [
    FILE_A,
    FILE_A << 1,
    FILE_A << 2,
    FILE_A << 3,
    FILE_A << 4,
    FILE_A << 5,
    FILE_A << 6,
    FILE_A << 7,
];

/// Rank masks `1..8`.
pub const RANK_MASKS: [u64; 8] = [
    RANK_1,
    RANK_1 << 8,
    RANK_1 << 16,
    RANK_1 << 24,
    RANK_1 << 32,
    RANK_1 << 40,
    RANK_1 << 48,
    RANK_1 << 56,
];

#[inline]
pub const fn square_bit(square: Square) -> u64 {
    1u64 << square
}

/// Index of the lowest set bit. Caller guarantees `bb != 0`.
#[inline]
pub const fn lsb(bb: u64) -> Square {
    bb.trailing_zeros() as Square
}

/// Index of the highest set bit. Caller guarantees `bb != 0`.
#[inline]
pub const fn msb(bb: u64) -> Square {
    (63 - bb.leading_zeros()) as Square
}

#[inline]
pub const fn popcount(bb: u64) -> u32 {
    bb.count_ones()
}

/// Remove and return the lowest set square.
#[inline]
pub fn pop_lsb(bb: &mut u64) -> Square {
    let sq = lsb(*bb);
    *bb &= *bb - 1;
    sq
}

/// Iterator over the set squares of a bitboard, lowest first.
#[derive(Debug, Clone, Copy)]
pub struct Squares(pub u64);

impl Iterator for Squares {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        Some(pop_lsb(&mut self.0))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Squares {}

/// Files adjacent to `file` (excluding the file itself).
#[inline]
pub const fn adjacent_files(file: u8) -> u64 {
    let mut mask = 0u64;
    if file > 0 {
        mask |= FILE_MASKS[(file - 1) as usize];
    }
    if file < 7 {
        mask |= FILE_MASKS[(file + 1) as usize];
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_find_extreme_bits() {
        let bb = (1u64 << 3) | (1u64 << 60);
        assert_eq!(lsb(bb), 3);
        assert_eq!(msb(bb), 60);
        assert_eq!(popcount(bb), 2);
    }

    #[test]
    fn squares_iterator_walks_low_to_high() {
        let collected: Vec<Square> = Squares(0b1010_0001).collect();
        assert_eq!(collected, vec![0, 5, 7]);
    }

    #[test]
    fn adjacent_files_on_edges() {
        assert_eq!(adjacent_files(0), FILE_MASKS[1]);
        assert_eq!(adjacent_files(4), FILE_MASKS[3] | FILE_MASKS[5]);
    }
}
