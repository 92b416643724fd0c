//! Directional ray masks and between-square masks.
//!
//! Directions `0..4` step towards higher square indices, so the first blocker
//! on those rays is the lowest set bit; directions `4..8` step downwards and
//! use the highest set bit.

use crate::game_state::chess_types::Square;
use crate::moves::bit_utils::{lsb, msb};
use crate::moves::knight_moves::square_if_on_board;

/// `(file_step, rank_step)` for N, NE, E, NW, S, SW, W, SE.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (-1, 1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (1, -1),
];

#[inline]
pub const fn is_orthogonal(direction: usize) -> bool {
    direction % 2 == 0
}

#[inline]
pub const fn is_forward(direction: usize) -> bool {
    direction < 4
}

/// Every square reachable from `square` in `direction` on an empty board.
pub static RAY_MASKS: [[u64; 64]; 8] = build_ray_masks();

/// Squares strictly between two aligned squares; zero when not aligned.
pub static BETWEEN: [[u64; 64]; 64] = build_between();

const fn build_ray_masks() -> [[u64; 64]; 8] {
    let mut table = [[0u64; 64]; 8];
    let mut dir = 0usize;

    while dir < 8 {
        let mut sq = 0usize;
        while sq < 64 {
            let (df, dr) = DIRECTIONS[dir];
            let mut file = (sq % 8) as i32 + df;
            let mut rank = (sq / 8) as i32 + dr;
            let mut ray = 0u64;
            loop {
                let bit = square_if_on_board(file, rank);
                if bit == 0 {
                    break;
                }
                ray |= bit;
                file += df;
                rank += dr;
            }
            table[dir][sq] = ray;
            sq += 1;
        }
        dir += 1;
    }

    table
}

const fn build_between() -> [[u64; 64]; 64] {
    let mut table = [[0u64; 64]; 64];
    let mut from = 0usize;

    while from < 64 {
        let mut dir = 0usize;
        while dir < 8 {
            let (df, dr) = DIRECTIONS[dir];
            let mut file = (from % 8) as i32 + df;
            let mut rank = (from / 8) as i32 + dr;
            let mut path = 0u64;
            loop {
                let bit = square_if_on_board(file, rank);
                if bit == 0 {
                    break;
                }
                table[from][bit.trailing_zeros() as usize] = path;
                path |= bit;
                file += df;
                rank += dr;
            }
            dir += 1;
        }
        from += 1;
    }

    table
}

#[inline]
pub fn between(a: Square, b: Square) -> u64 {
    BETWEEN[a as usize][b as usize]
}

/// Nearest occupied square from `square` along `direction`, if any.
#[inline]
pub fn first_blocker(square: Square, direction: usize, occupancy: u64) -> Option<Square> {
    let hits = RAY_MASKS[direction][square as usize] & occupancy;
    if hits == 0 {
        return None;
    }
    Some(if is_forward(direction) { lsb(hits) } else { msb(hits) })
}
