//! Magic bitboards for sliding piece attacks.
//!
//! Each square gets a relevant-occupancy mask, a magic multiplier and a
//! shift such that `((occ & mask) * magic) >> shift` is a perfect hash of
//! the blocker configuration into a slice of one shared attack table.
//! Magics are found at startup by trying random sparse candidates and
//! verifying them over every blocker subset of the mask; the ray-walking
//! generators used to fill the table stay around as the reference
//! implementation for tests.

use once_cell::sync::Lazy;
use rand::prelude::*;

/// Per-square magic lookup data.
struct Magic {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline]
    fn index(&self, occupancy: u64) -> usize {
        let hash = (occupancy & self.mask).wrapping_mul(self.magic);
        self.offset + (hash >> self.shift) as usize
    }
}

/// Shared attack table plus the per-square magics for both slider kinds.
struct SliderTables {
    rook: [Magic; 64],
    bishop: [Magic; 64],
    attacks: Vec<u64>,
}

static SLIDER_TABLES: Lazy<SliderTables> = Lazy::new(build_slider_tables);

/// Rook attacks for `sq` under `occupancy`: mask, multiply, shift, load.
#[inline]
pub(crate) fn rook_attacks(sq: usize, occupancy: u64) -> u64 {
    let tables = &*SLIDER_TABLES;
    tables.attacks[tables.rook[sq].index(occupancy)]
}

/// Bishop attacks for `sq` under `occupancy`.
#[inline]
pub(crate) fn bishop_attacks(sq: usize, occupancy: u64) -> u64 {
    let tables = &*SLIDER_TABLES;
    tables.attacks[tables.bishop[sq].index(occupancy)]
}

/// Queen attacks: rook rays unioned with bishop rays.
#[inline]
pub(crate) fn queen_attacks(sq: usize, occupancy: u64) -> u64 {
    rook_attacks(sq, occupancy) | bishop_attacks(sq, occupancy)
}

// ---------------------------------------------------------------------------
// Ray-walk reference generators
// ---------------------------------------------------------------------------

const ROOK_DIRECTIONS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(isize, isize); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Walk the four rays from `sq`, stopping at (and including) the first
/// blocker in each direction.
fn ray_attacks(sq: usize, occupancy: u64, directions: &[(isize, isize); 4]) -> u64 {
    let rank = (sq / 8) as isize;
    let file = (sq % 8) as isize;
    let mut attacks = 0u64;

    for (dr, df) in directions {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let bit = 1u64 << ((r as usize) * 8 + (f as usize));
            attacks |= bit;
            if occupancy & bit != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }

    attacks
}

/// Reference rook attacks, used to cross-validate the magic lookups.
#[cfg(test)]
pub(crate) fn slow_rook_attacks(sq: usize, occupancy: u64) -> u64 {
    ray_attacks(sq, occupancy, &ROOK_DIRECTIONS)
}

/// Reference bishop attacks, used to cross-validate the magic lookups.
#[cfg(test)]
pub(crate) fn slow_bishop_attacks(sq: usize, occupancy: u64) -> u64 {
    ray_attacks(sq, occupancy, &BISHOP_DIRECTIONS)
}

/// Relevant-occupancy mask: the piece's rays with the board edges cut off,
/// since an edge square can never hide a further blocker.
fn relevant_mask(sq: usize, directions: &[(isize, isize); 4]) -> u64 {
    let rank = (sq / 8) as isize;
    let file = (sq % 8) as isize;
    let mut mask = 0u64;

    for (dr, df) in directions {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&(r + dr)) && (0..8).contains(&(f + df)) {
            mask |= 1u64 << ((r as usize) * 8 + (f as usize));
            r += dr;
            f += df;
        }
    }

    mask
}

/// Expand `index` into a blocker set: bit i of the index places a blocker
/// on the i-th set square of `mask`.
fn occupancy_subset(index: usize, mut mask: u64) -> u64 {
    let mut occupancy = 0u64;
    let mut bit = 0;
    while mask != 0 {
        let sq = mask.trailing_zeros();
        mask &= mask - 1;
        if index & (1 << bit) != 0 {
            occupancy |= 1u64 << sq;
        }
        bit += 1;
    }
    occupancy
}

// ---------------------------------------------------------------------------
// Magic search
// ---------------------------------------------------------------------------

/// Try random sparse candidates until one hashes every blocker subset of
/// `mask` without mapping two different attack sets to the same slot.
/// Fills `table[..1 << bits]` with the attack sets on success.
fn find_magic(
    sq: usize,
    mask: u64,
    directions: &[(isize, isize); 4],
    rng: &mut StdRng,
    table: &mut [u64],
) -> u64 {
    let bits = mask.count_ones();
    let shift = 64 - bits;
    let subsets = 1usize << bits;

    let mut occupancies = vec![0u64; subsets];
    let mut reference = vec![0u64; subsets];
    for (index, (occ, attack)) in occupancies.iter_mut().zip(reference.iter_mut()).enumerate() {
        *occ = occupancy_subset(index, mask);
        *attack = ray_attacks(sq, *occ, directions);
    }

    loop {
        // Sparse candidate: AND of three random words
        let candidate = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        // A magic that cannot spread the mask's high bits never verifies
        if (mask.wrapping_mul(candidate) >> 56).count_ones() < 6 {
            continue;
        }

        table[..subsets].fill(0);
        let mut used = vec![false; subsets];
        let mut ok = true;

        for (occ, attack) in occupancies.iter().zip(reference.iter()) {
            let slot = (occ.wrapping_mul(candidate) >> shift) as usize;
            if used[slot] && table[slot] != *attack {
                ok = false;
                break;
            }
            used[slot] = true;
            table[slot] = *attack;
        }

        if ok {
            return candidate;
        }
    }
}

/// Find the magics for one slider kind, filling the shared table from
/// `*offset` onward.
fn build_magics(
    directions: &[(isize, isize); 4],
    rng: &mut StdRng,
    attacks: &mut [u64],
    offset: &mut usize,
) -> [Magic; 64] {
    std::array::from_fn(|sq| {
        let mask = relevant_mask(sq, directions);
        let bits = mask.count_ones();
        let size = 1usize << bits;
        let magic = find_magic(
            sq,
            mask,
            directions,
            rng,
            &mut attacks[*offset..*offset + size],
        );
        let entry = Magic {
            mask,
            magic,
            shift: 64 - bits,
            offset: *offset,
        };
        *offset += size;
        entry
    })
}

fn build_slider_tables() -> SliderTables {
    // Fixed seed: identical magics on every run
    let mut rng = StdRng::seed_from_u64(0xB10C_8A11_5EED);

    let mut total = 0usize;
    for sq in 0..64 {
        total += 1usize << relevant_mask(sq, &ROOK_DIRECTIONS).count_ones();
        total += 1usize << relevant_mask(sq, &BISHOP_DIRECTIONS).count_ones();
    }
    let mut attacks = vec![0u64; total];

    let mut offset = 0usize;
    let rook = build_magics(&ROOK_DIRECTIONS, &mut rng, &mut attacks, &mut offset);
    let bishop = build_magics(&BISHOP_DIRECTIONS, &mut rng, &mut attacks, &mut offset);

    SliderTables {
        rook,
        bishop,
        attacks,
    }
}
