//! Bishop, rook and queen attacks through magic-number indexed tables.
//!
//! The tables are filled once on first use. Each square's magic is checked
//! against every blocker subset while filling; a constant that collides
//! destructively is replaced by a seeded search so lookups stay exact.

use std::sync::OnceLock;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::game_state::chess_types::Square;

const ROOK_MAGICS: [u64; 64] = [
    0x8a80104000800020, 0x140002000100040, 0x2801880a0017001, 0x100081001000420,
    0x200020010080420, 0x3001c0002010008, 0x8480008002000100, 0x2080088004402900,
    0x800098204000, 0x2024401000200040, 0x100802000801000, 0x120800800801000,
    0x208808088000400, 0x2802200800400, 0x2200800100020080, 0x801000060821100,
    0x80044006422000, 0x100808020004000, 0x12108a0010204200, 0x140848010000802,
    0x481828014002800, 0x8094004002004100, 0x4010040010010802, 0x20008806104,
    0x100400080208000, 0x2040002120081000, 0x21200680100081, 0x20100080080080,
    0x2000a00200410, 0x20080800400, 0x80088400100102, 0x80004600042881,
    0x4040008040800020, 0x440003000200801, 0x4200011004500, 0x188020010100100,
    0x14800401802800, 0x2080040080800200, 0x124080204001001, 0x200046502000484,
    0x480400080088020, 0x1000422010034000, 0x30200100110040, 0x100021010009,
    0x2002080100110004, 0x202008004008002, 0x20020004010100, 0x2048440040820001,
    0x101002200408200, 0x40802000401080, 0x4008142004410100, 0x2060820c0120200,
    0x1001004080100, 0x20c020080040080, 0x2935610830022400, 0x44440041009200,
    0x280001040802101, 0x2100190040002085, 0x80c0084100102001, 0x4024081001000421,
    0x20030a0244872, 0x12001008414402, 0x2006104900a0804, 0x1004081002402,
];

const BISHOP_MAGICS: [u64; 64] = [
    0x40040844404084, 0x2004208a004208, 0x10190041080202, 0x108060845042010,
    0x581104180800210, 0x2112080446200010, 0x1080820820060210, 0x3c0808410220200,
    0x4050404440404, 0x21001420088, 0x24d0080801082102, 0x1020a0a020400,
    0x40308200402, 0x4011002100800, 0x401484104104005, 0x801010402020200,
    0x400210c3880100, 0x404022024108200, 0x810018200204102, 0x4002801a02003,
    0x85040820080400, 0x810102c808880400, 0xe900410884800, 0x8002020480840102,
    0x220200865090201, 0x2010100a02021202, 0x152048408022401, 0x20080002081110,
    0x4001001021004000, 0x800040400a011002, 0xe4004081011002, 0x1c004001012080,
    0x8004200962a00220, 0x8422100208500202, 0x2000402200300c08, 0x8646020080080080,
    0x80020a0200100808, 0x2010004880111000, 0x623000a080011400, 0x42008c0340209202,
    0x209188240001000, 0x400408a884001800, 0x110400a6080400, 0x1840060a44020800,
    0x90080104000041, 0x201011000808101, 0x1a2208080504f080, 0x8012020600211212,
    0x500861011240000, 0x180806108200800, 0x4000020e01040044, 0x300000261044000a,
    0x802241102020002, 0x20906061210001, 0x5a84841004010310, 0x4010801011c04,
    0xa010109502200, 0x4a02012000, 0x500201010098b028, 0x8040002811040900,
    0x28000010020204, 0x6000020202d0240, 0x8918844842082200, 0x4010011029020020,
];

const ROOK_STEPS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_STEPS: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

#[derive(Debug, Clone, Copy, Default)]
struct MagicEntry {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl MagicEntry {
    #[inline]
    fn index(&self, occupancy: u64) -> usize {
        self.offset + ((occupancy & self.mask).wrapping_mul(self.magic) >> self.shift) as usize
    }
}

#[derive(Debug)]
struct SliderTables {
    rook: [MagicEntry; 64],
    bishop: [MagicEntry; 64],
    attacks: Vec<u64>,
}

static TABLES: OnceLock<SliderTables> = OnceLock::new();

#[inline]
fn tables() -> &'static SliderTables {
    TABLES.get_or_init(build_tables)
}

/// Build the attack tables now instead of inside the first search.
pub fn init_slider_tables() {
    let _ = tables();
}

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    let t = tables();
    t.attacks[t.rook[square as usize].index(occupancy)]
}

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    let t = tables();
    t.attacks[t.bishop[square as usize].index(occupancy)]
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    rook_attacks(square, occupancy) | bishop_attacks(square, occupancy)
}

fn build_tables() -> SliderTables {
    let mut attacks = Vec::with_capacity(110_000);
    let mut rook = [MagicEntry::default(); 64];
    let mut bishop = [MagicEntry::default(); 64];

    for sq in 0..64u8 {
        rook[sq as usize] = fill_square(sq, &ROOK_STEPS, ROOK_MAGICS[sq as usize], &mut attacks);
        bishop[sq as usize] =
            fill_square(sq, &BISHOP_STEPS, BISHOP_MAGICS[sq as usize], &mut attacks);
    }

    SliderTables {
        rook,
        bishop,
        attacks,
    }
}

fn fill_square(
    square: Square,
    steps: &[(i32, i32); 4],
    seed_magic: u64,
    attacks: &mut Vec<u64>,
) -> MagicEntry {
    let mask = relevant_mask(square, steps);
    let bits = mask.count_ones();
    let subsets = blocker_subsets(mask);
    let reference: Vec<u64> = subsets
        .iter()
        .map(|&occ| trace_attacks(square, steps, occ))
        .collect();

    let offset = attacks.len();
    let mut entry = MagicEntry {
        mask,
        magic: seed_magic,
        shift: 64 - bits,
        offset: 0,
    };

    let table = match try_magic(&entry, &subsets, &reference) {
        Some(table) => table,
        None => {
            log::warn!("magic constant for square {square} collides, searching a replacement");
            let mut rng = StdRng::seed_from_u64(0x5EED_0000 ^ u64::from(square));
            loop {
                entry.magic = rng.random::<u64>() & rng.random::<u64>() & rng.random::<u64>();
                if (mask.wrapping_mul(entry.magic) >> 56).count_ones() < 6 {
                    continue;
                }
                if let Some(table) = try_magic(&entry, &subsets, &reference) {
                    break table;
                }
            }
        }
    };

    attacks.extend_from_slice(&table);
    entry.offset = offset;
    entry
}

/// Fill a local table for `entry`; `None` on a destructive collision.
fn try_magic(entry: &MagicEntry, subsets: &[u64], reference: &[u64]) -> Option<Vec<u64>> {
    let size = 1usize << (64 - entry.shift);
    let mut table = vec![u64::MAX; size];
    for (&occ, &att) in subsets.iter().zip(reference) {
        let idx = entry.index(occ);
        if table[idx] == u64::MAX {
            table[idx] = att;
        } else if table[idx] != att {
            return None;
        }
    }
    Some(table)
}

/// Blocker squares that can change the attack set. The last square of each
/// ray is left out since a piece there never hides anything behind it.
fn relevant_mask(square: Square, steps: &[(i32, i32); 4]) -> u64 {
    let file = i32::from(square % 8);
    let rank = i32::from(square / 8);
    let mut mask = 0u64;

    for &(df, dr) in steps {
        let mut f = file + df;
        let mut r = rank + dr;
        while (0..8).contains(&f) && (0..8).contains(&r) {
            let next_on_board = (0..8).contains(&(f + df)) && (0..8).contains(&(r + dr));
            if !next_on_board {
                break;
            }
            mask |= 1u64 << (r * 8 + f);
            f += df;
            r += dr;
        }
    }

    mask
}

fn blocker_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn trace_attacks(square: Square, steps: &[(i32, i32); 4], occupancy: u64) -> u64 {
    let file = i32::from(square % 8);
    let rank = i32::from(square / 8);
    let mut attacks = 0u64;

    for &(df, dr) in steps {
        let mut f = file + df;
        let mut r = rank + dr;
        while (0..8).contains(&f) && (0..8).contains(&r) {
            let bit = 1u64 << (r * 8 + f);
            attacks |= bit;
            if occupancy & bit != 0 {
                break;
            }
            f += df;
            r += dr;
        }
    }

    attacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn eager_init_builds_the_shared_tables() {
        init_slider_tables();
        let built = TABLES.get().expect("tables should be built after init");
        assert!(std::ptr::eq(built, tables()));
        assert_eq!(queen_attacks(27, 0).count_ones(), 27);
    }

    #[test]
    fn rook_on_empty_board_sees_fourteen_squares() {
        for sq in [0u8, 27, 63] {
            assert_eq!(rook_attacks(sq, 0).count_ones(), 14);
        }
    }

    #[test]
    fn bishop_attacks_stop_at_first_blocker() {
        let d4 = 27u8;
        let blocker_f6 = 1u64 << 45;
        let attacks = bishop_attacks(d4, blocker_f6);
        assert_ne!(attacks & blocker_f6, 0);
        assert_eq!(attacks & (1u64 << 54), 0);
    }

    #[test]
    fn relevant_mask_sizes_match_known_counts() {
        assert_eq!(relevant_mask(0, &ROOK_STEPS).count_ones(), 12);
        assert_eq!(relevant_mask(27, &ROOK_STEPS).count_ones(), 10);
        assert_eq!(relevant_mask(27, &BISHOP_STEPS).count_ones(), 9);
        assert_eq!(relevant_mask(0, &BISHOP_STEPS).count_ones(), 6);
    }

    #[test]
    fn magic_lookups_match_ray_tracing_on_random_occupancy() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let occ = rng.random::<u64>() & rng.random::<u64>();
            let sq = rng.random_range(0..64u8);
            assert_eq!(rook_attacks(sq, occ), trace_attacks(sq, &ROOK_STEPS, occ));
            assert_eq!(bishop_attacks(sq, occ), trace_attacks(sq, &BISHOP_STEPS, occ));
        }
    }
}
