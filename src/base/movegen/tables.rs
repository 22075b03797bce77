/*
  Heron, a chess engine.
  Copyright (C) 2023 The Heron Authors.

  Heron is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Heron is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! Lookup tables for move generation, built on rotated bitboards.
//!
//! Sliding attacks are answered by four tables, one per ray angle (0° for
//! ranks, 90° for files, 45° and 135° for the two diagonal directions). The
//! board keeps one occupancy bitboard per angle, permuted so that every ray
//! of the given angle occupies consecutive bits. A ray query then shifts and
//! masks the rotated occupancy down to the 8 (or fewer) squares of the ray,
//! and the table maps `(square, occupancy window)` straight to the attacked
//! squares in normal coordinates, first blocker included. The caller filters
//! out its own pieces.
//!
//! The step tables (pawn, knight, king, and the empty-board slider masks) and
//! the inclusive `line` segments are plain per-square lookups.

use once_cell::sync::Lazy;

use crate::base::{Bitboard, Color, Square};

/// Number of 8-bit occupancy windows per square.
const NUM_WINDOWS: usize = 256;

/// Base index of each diagonal row in the 45°/135° coordinate systems.
/// Row `k` holds the `8 - |k - 7|` squares of one diagonal.
const DIAG_BASE: [u8; 15] = {
    let mut base = [0u8; 15];
    let mut k = 1;
    while k < 15 {
        let prev_len = 8 - (k as i8 - 1 - 7).unsigned_abs();
        base[k] = base[k - 1] + prev_len;
        k += 1;
    }
    base
};

/// Map a square to its index in the 45°-rotated coordinate system, which
/// lays out the a1–h8-direction diagonals contiguously.
pub(crate) const fn rot45(sq: Square) -> u8 {
    let file = sq as u8 & 7;
    let rank = sq as u8 >> 3;
    let diag = file as i8 - rank as i8;
    let pos = if diag >= 0 { rank } else { file };
    DIAG_BASE[(7 - diag) as usize] + pos
}

/// Map a square to its index in the 90°-rotated coordinate system, which
/// lays out the files contiguously.
pub(crate) const fn rot90(sq: Square) -> u8 {
    let file = sq as u8 & 7;
    let rank = sq as u8 >> 3;
    (file << 3) | (7 - rank)
}

/// Map a square to its index in the 135°-rotated coordinate system, which
/// lays out the a8–h1-direction diagonals contiguously.
pub(crate) const fn rot135(sq: Square) -> u8 {
    let file = sq as u8 & 7;
    let rank = sq as u8 >> 3;
    let pos = if file < 7 - rank { file } else { 7 - rank };
    DIAG_BASE[(file + rank) as usize] + pos
}

/// Window shift per rotated index, 0° and 90° flavor: each rank-sized row
/// starts at a multiple of 8.
const fn shift_v(rot: u8) -> u8 {
    rot & 56
}

/// Window shift per rotated index, diagonal flavor: the base of the diagonal
/// row containing the index.
const SHIFT_D: [u8; 64] = {
    let mut shifts = [0u8; 64];
    let mut k = 0;
    while k < 15 {
        let len = 8 - (k as i8 - 7).unsigned_abs();
        let mut i = 0;
        while i < len {
            shifts[(DIAG_BASE[k] + i) as usize] = DIAG_BASE[k];
            i += 1;
        }
        k += 1;
    }
    shifts
};

/// Window mask per rotated index, diagonal flavor: as wide as the diagonal.
const MASK_D: [u64; 64] = {
    let mut masks = [0u64; 64];
    let mut k = 0;
    while k < 15 {
        let len = 8 - (k as i8 - 7).unsigned_abs();
        let mut i = 0;
        while i < len {
            masks[(DIAG_BASE[k] + i) as usize] = (1u64 << len) - 1;
            i += 1;
        }
        k += 1;
    }
    masks
};

/// Helper macro to build the inverse of one of the rotation permutations.
macro_rules! unrotation {
    ($forward: ident) => {{
        let mut inverse = [Square::A1; 64];
        let mut i = 0u8;
        while i < 64 {
            // SAFETY: i is in 0..64 by the loop bound.
            let sq: Square = unsafe { std::mem::transmute::<u8, Square>(i) };
            inverse[$forward(sq) as usize] = sq;
            i += 1;
        }
        inverse
    }};
}

/// The identity permutation, used for the unrotated (rank) table.
const fn rot0(sq: Square) -> u8 {
    sq as u8
}

/// Inverse of [`rot0`], i.e. the squares in order.
const UNROT0: [Square; 64] = unrotation!(rot0);
/// Inverse of [`rot45`]: rotated index back to the normal square.
const UNROT45: [Square; 64] = unrotation!(rot45);
/// Inverse of [`rot90`]: rotated index back to the normal square.
const UNROT90: [Square; 64] = unrotation!(rot90);
/// Inverse of [`rot135`]: rotated index back to the normal square.
const UNROT135: [Square; 64] = unrotation!(rot135);

/// Attacks along one row of up to `len` squares: from `pos`, step outward in
/// both directions, stopping at (and including) the first occupied bit.
const fn row_ray(pos: u8, window: u8, len: u8) -> u8 {
    let mut ray = 0u8;
    let mut i = pos + 1;
    while i < len {
        ray |= 1 << i;
        if window & (1 << i) != 0 {
            break;
        }
        i += 1;
    }
    let mut i = pos as i8 - 1;
    while i >= 0 {
        ray |= 1 << i;
        if window & (1 << i) != 0 {
            break;
        }
        i -= 1;
    }
    ray
}

/// Build one angle's attack table.
/// `rot` rotates a square into the angle's coordinates, `unrot` maps rotated
/// indices back, and `diagonal` selects the window geometry.
fn build_ray_table(
    rot: fn(Square) -> u8,
    unrot: &[Square; 64],
    diagonal: bool,
) -> Vec<[Bitboard; NUM_WINDOWS]> {
    let mut table = vec![[Bitboard::EMPTY; NUM_WINDOWS]; 64];
    for sq in Bitboard::ALL {
        let r = rot(sq);
        let (shift, len) = if diagonal {
            (SHIFT_D[r as usize], MASK_D[r as usize].count_ones() as u8)
        } else {
            (shift_v(r), 8)
        };
        let pos = r - shift;
        for window in 0..NUM_WINDOWS {
            #[allow(clippy::cast_possible_truncation)]
            let ray = row_ray(pos, window as u8, len);
            let mut attacks = Bitboard::EMPTY;
            for i in 0..len {
                if ray & (1 << i) != 0 {
                    attacks.insert(unrot[(shift + i) as usize]);
                }
            }
            table[sq as usize][window] = attacks;
        }
    }
    table
}

/// Rank attacks, indexed by `(square, 0° occupancy window)`.
static RAYS_0: Lazy<Vec<[Bitboard; NUM_WINDOWS]>> =
    Lazy::new(|| build_ray_table(rot0, &UNROT0, false));
/// Diagonal (a1–h8 direction) attacks, indexed by `(square, 45° window)`.
static RAYS_45: Lazy<Vec<[Bitboard; NUM_WINDOWS]>> =
    Lazy::new(|| build_ray_table(rot45, &UNROT45, true));
/// File attacks, indexed by `(square, 90° occupancy window)`.
static RAYS_90: Lazy<Vec<[Bitboard; NUM_WINDOWS]>> =
    Lazy::new(|| build_ray_table(rot90, &UNROT90, false));
/// Anti-diagonal (a8–h1 direction) attacks, indexed by `(square, 135° window)`.
static RAYS_135: Lazy<Vec<[Bitboard; NUM_WINDOWS]>> =
    Lazy::new(|| build_ray_table(rot135, &UNROT135, true));

#[must_use]
/// Get the rank attacks from `sq`, given the unrotated occupancy.
/// The first blocker in each direction is included.
pub fn rank_attacks(sq: Square, occupancy0: Bitboard) -> Bitboard {
    let shift = shift_v(sq as u8);
    let window = (occupancy0.as_u64() >> shift) & 0xFF;
    RAYS_0[sq as usize][window as usize]
}

#[must_use]
/// Get the a1–h8-direction diagonal attacks from `sq`, given the 45°-rotated
/// occupancy.
pub fn diag_attacks(sq: Square, occupancy45: Bitboard) -> Bitboard {
    let r = rot45(sq) as usize;
    let window = (occupancy45.as_u64() >> SHIFT_D[r]) & MASK_D[r];
    RAYS_45[sq as usize][window as usize]
}

#[must_use]
/// Get the file attacks from `sq`, given the 90°-rotated occupancy.
pub fn file_attacks(sq: Square, occupancy90: Bitboard) -> Bitboard {
    let shift = shift_v(rot90(sq));
    let window = (occupancy90.as_u64() >> shift) & 0xFF;
    RAYS_90[sq as usize][window as usize]
}

#[must_use]
/// Get the a8–h1-direction diagonal attacks from `sq`, given the
/// 135°-rotated occupancy.
pub fn anti_diag_attacks(sq: Square, occupancy135: Bitboard) -> Bitboard {
    let r = rot135(sq) as usize;
    let window = (occupancy135.as_u64() >> SHIFT_D[r]) & MASK_D[r];
    RAYS_135[sq as usize][window as usize]
}

/// Single pawn pushes per color and square. Zero on the last rank.
const PAWN_PUSHES: [[Bitboard; 64]; 2] = {
    let mut pushes = [[Bitboard::EMPTY; 64]; 2];
    let mut i = 0u8;
    while i < 64 {
        let bb = Bitboard::new(1 << i);
        pushes[Color::White as usize][i as usize] = bb.north();
        pushes[Color::Black as usize][i as usize] = bb.south();
        i += 1;
    }
    pushes
};

/// Double pawn pushes per color and square. Nonzero only from the start rank.
const PAWN_DOUBLE_PUSHES: [[Bitboard; 64]; 2] = {
    let mut pushes = [[Bitboard::EMPTY; 64]; 2];
    let mut i = 0u8;
    while i < 64 {
        let bb = Bitboard::new(1 << i);
        pushes[Color::White as usize][i as usize] =
            Bitboard::new(bb.as_u64() & Bitboard::RANKS[1].as_u64()).north().north();
        pushes[Color::Black as usize][i as usize] =
            Bitboard::new(bb.as_u64() & Bitboard::RANKS[6].as_u64()).south().south();
        i += 1;
    }
    pushes
};

/// Pawn capture squares per color and square.
const PAWN_CAPTURES: [[Bitboard; 64]; 2] = {
    let mut captures = [[Bitboard::EMPTY; 64]; 2];
    let mut i = 0u8;
    while i < 64 {
        let bb = Bitboard::new(1 << i);
        captures[Color::White as usize][i as usize] =
            Bitboard::new(bb.northeast().as_u64() | bb.northwest().as_u64());
        captures[Color::Black as usize][i as usize] =
            Bitboard::new(bb.southeast().as_u64() | bb.southwest().as_u64());
        i += 1;
    }
    captures
};

/// Knight moves per square.
const KNIGHT_STEPS: [Bitboard; 64] = {
    let mut steps = [Bitboard::EMPTY; 64];
    let mut i = 0u8;
    while i < 64 {
        let bb = Bitboard::new(1 << i);
        steps[i as usize] = Bitboard::new(
            bb.north().northeast().as_u64()
                | bb.north().northwest().as_u64()
                | bb.south().southeast().as_u64()
                | bb.south().southwest().as_u64()
                | bb.east().northeast().as_u64()
                | bb.east().southeast().as_u64()
                | bb.west().northwest().as_u64()
                | bb.west().southwest().as_u64(),
        );
        i += 1;
    }
    steps
};

/// King moves per square.
const KING_STEPS: [Bitboard; 64] = {
    let mut steps = [Bitboard::EMPTY; 64];
    let mut i = 0u8;
    while i < 64 {
        let bb = Bitboard::new(1 << i);
        steps[i as usize] = Bitboard::new(
            bb.north().as_u64()
                | bb.south().as_u64()
                | bb.east().as_u64()
                | bb.west().as_u64()
                | bb.northeast().as_u64()
                | bb.northwest().as_u64()
                | bb.southeast().as_u64()
                | bb.southwest().as_u64(),
        );
        i += 1;
    }
    steps
};

/// Step a bitboard once in one of the eight compass directions.
/// Directions 0..4 are the rook's, 4..8 the bishop's.
const fn compass_step(bb: Bitboard, direction: usize) -> Bitboard {
    match direction {
        0 => bb.north(),
        1 => bb.south(),
        2 => bb.east(),
        3 => bb.west(),
        4 => bb.northeast(),
        5 => bb.northwest(),
        6 => bb.southeast(),
        _ => bb.southwest(),
    }
}

/// Walk from a single-square bitboard in one direction until the edge,
/// collecting every square passed.
const fn walk(start: Bitboard, direction: usize) -> Bitboard {
    let mut ray = Bitboard::EMPTY;
    let mut cur = compass_step(start, direction);
    while !cur.is_empty() {
        ray = Bitboard::new(ray.as_u64() | cur.as_u64());
        cur = compass_step(cur, direction);
    }
    ray
}

/// Empty-board bishop rays per square (the square itself excluded).
const BISHOP_RAYS: [Bitboard; 64] = {
    let mut rays = [Bitboard::EMPTY; 64];
    let mut i = 0u8;
    while i < 64 {
        let bb = Bitboard::new(1 << i);
        rays[i as usize] = Bitboard::new(
            walk(bb, 4).as_u64() | walk(bb, 5).as_u64() | walk(bb, 6).as_u64()
                | walk(bb, 7).as_u64(),
        );
        i += 1;
    }
    rays
};

/// Empty-board rook rays per square (the square itself excluded).
const ROOK_RAYS: [Bitboard; 64] = {
    let mut rays = [Bitboard::EMPTY; 64];
    let mut i = 0u8;
    while i < 64 {
        let bb = Bitboard::new(1 << i);
        rays[i as usize] = Bitboard::new(
            walk(bb, 0).as_u64() | walk(bb, 1).as_u64() | walk(bb, 2).as_u64()
                | walk(bb, 3).as_u64(),
        );
        i += 1;
    }
    rays
};

/// Inclusive straight or diagonal segments between aligned square pairs.
const LINES: [[Bitboard; 64]; 64] = {
    let mut lines = [[Bitboard::EMPTY; 64]; 64];
    let mut from = 0usize;
    while from < 64 {
        lines[from][from] = Bitboard::new(1 << from);
        let mut d = 0;
        while d < 8 {
            let mut path = 1u64 << from;
            let mut cur = compass_step(Bitboard::new(1 << from), d);
            while !cur.is_empty() {
                path |= cur.as_u64();
                lines[from][cur.trailing_zeros() as usize] = Bitboard::new(path);
                cur = compass_step(cur, d);
            }
            d += 1;
        }
        from += 1;
    }
    lines
};

#[must_use]
/// Get the single-push square of a pawn of the given color, empty on the
/// last rank.
pub fn pawn_pushes(color: Color, sq: Square) -> Bitboard {
    PAWN_PUSHES[color as usize][sq as usize]
}

#[must_use]
/// Get the double-push square of a pawn of the given color, empty except
/// from the pawn's start rank.
pub fn pawn_double_pushes(color: Color, sq: Square) -> Bitboard {
    PAWN_DOUBLE_PUSHES[color as usize][sq as usize]
}

#[must_use]
/// Get the squares a pawn of the given color attacks from `sq`.
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    PAWN_CAPTURES[color as usize][sq as usize]
}

#[must_use]
/// Get the squares a knight moves to from `sq`.
pub fn knight_moves(sq: Square) -> Bitboard {
    KNIGHT_STEPS[sq as usize]
}

#[must_use]
/// Get the squares a king moves to from `sq`, castling excluded.
pub fn king_moves(sq: Square) -> Bitboard {
    KING_STEPS[sq as usize]
}

#[must_use]
/// Get the squares a bishop on an empty board reaches from `sq`.
pub fn bishop_rays(sq: Square) -> Bitboard {
    BISHOP_RAYS[sq as usize]
}

#[must_use]
/// Get the squares a rook on an empty board reaches from `sq`.
pub fn rook_rays(sq: Square) -> Bitboard {
    ROOK_RAYS[sq as usize]
}

#[must_use]
/// Get the squares a queen on an empty board reaches from `sq`.
pub fn queen_rays(sq: Square) -> Bitboard {
    BISHOP_RAYS[sq as usize] | ROOK_RAYS[sq as usize]
}

#[must_use]
/// Get the inclusive straight or diagonal segment from `a` to `b`, or the
/// empty set if the squares are not aligned.
///
/// # Examples
///
/// ```
/// use heron::base::{movegen::line, Bitboard, Square};
///
/// assert_eq!(
///     line(Square::A1, Square::A3),
///     Bitboard::EMPTY
///         .with_square(Square::A1)
///         .with_square(Square::A2)
///         .with_square(Square::A3)
/// );
/// assert_eq!(line(Square::A1, Square::B3), Bitboard::EMPTY);
/// ```
pub fn line(a: Square, b: Square) -> Bitboard {
    LINES[a as usize][b as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Slow reference: walk a ray square by square over a real occupancy.
    fn walk_attacks(sq: Square, occupancy: Bitboard, steps: &[fn(Bitboard) -> Bitboard]) -> Bitboard {
        let mut attacks = Bitboard::EMPTY;
        for &step in steps {
            let mut cur = step(Bitboard::from(sq));
            while !cur.is_empty() {
                attacks |= cur;
                if !(cur & occupancy).is_empty() {
                    break;
                }
                cur = step(cur);
            }
        }
        attacks
    }

    /// Rotate a full occupancy into one of the rotated coordinate systems.
    fn rotate(occupancy: Bitboard, rot: fn(Square) -> u8) -> Bitboard {
        let mut rotated = Bitboard::EMPTY;
        for sq in occupancy {
            rotated |= Bitboard::new(1 << rot(sq));
        }
        rotated
    }

    #[test]
    fn rotations_are_permutations() {
        for rot in [rot45, rot90, rot135] {
            let mut seen = [false; 64];
            for sq in Bitboard::ALL {
                let r = rot(sq) as usize;
                assert!(!seen[r]);
                seen[r] = true;
            }
        }
    }

    #[test]
    fn rotations_align_rays() {
        // squares on one a1-h8 diagonal are consecutive under rot45
        assert_eq!(rot45(Square::B2), rot45(Square::A1) + 1);
        assert_eq!(rot45(Square::C3), rot45(Square::A1) + 2);
        // squares on one file are consecutive under rot90
        assert_eq!(rot90(Square::A2), rot90(Square::A1).wrapping_sub(1));
        // squares on one a8-h1 diagonal are consecutive under rot135
        assert_eq!(rot135(Square::B7), rot135(Square::A8) + 1);
    }

    #[test]
    fn ray_tables_match_walking() {
        // a handful of irregular occupancies
        let occupancies = [
            Bitboard::new(0xFFFF_0000_0000_FFFF),
            Bitboard::new(0x0024_1800_1800_2400),
            Bitboard::new(0x8100_0042_4200_0081),
            Bitboard::EMPTY,
        ];
        for occupancy in occupancies {
            for sq in Bitboard::ALL {
                assert_eq!(
                    rank_attacks(sq, occupancy),
                    walk_attacks(sq, occupancy, &[Bitboard::east, Bitboard::west]),
                    "rank attacks from {sq}"
                );
                assert_eq!(
                    file_attacks(sq, rotate(occupancy, rot90)),
                    walk_attacks(sq, occupancy, &[Bitboard::north, Bitboard::south]),
                    "file attacks from {sq}"
                );
                assert_eq!(
                    diag_attacks(sq, rotate(occupancy, rot45)),
                    walk_attacks(sq, occupancy, &[Bitboard::northeast, Bitboard::southwest]),
                    "diagonal attacks from {sq}"
                );
                assert_eq!(
                    anti_diag_attacks(sq, rotate(occupancy, rot135)),
                    walk_attacks(sq, occupancy, &[Bitboard::northwest, Bitboard::southeast]),
                    "anti-diagonal attacks from {sq}"
                );
            }
        }
    }

    #[test]
    fn pawn_steps() {
        assert_eq!(
            pawn_pushes(Color::White, Square::E2),
            Bitboard::from(Square::E3)
        );
        assert_eq!(
            pawn_double_pushes(Color::White, Square::E2),
            Bitboard::from(Square::E4)
        );
        assert_eq!(pawn_double_pushes(Color::White, Square::E3), Bitboard::EMPTY);
        assert_eq!(pawn_pushes(Color::White, Square::E8), Bitboard::EMPTY);
        assert_eq!(
            pawn_attacks(Color::Black, Square::D5),
            Bitboard::EMPTY
                .with_square(Square::C4)
                .with_square(Square::E4)
        );
        assert_eq!(
            pawn_attacks(Color::White, Square::A2),
            Bitboard::from(Square::B3)
        );
    }

    #[test]
    fn knight_and_king_steps() {
        assert_eq!(knight_moves(Square::A1).len(), 2);
        assert_eq!(knight_moves(Square::E4).len(), 8);
        assert_eq!(king_moves(Square::A1).len(), 3);
        assert_eq!(king_moves(Square::E4).len(), 8);
    }

    #[test]
    fn empty_board_rays() {
        assert_eq!(rook_rays(Square::A1).len(), 14);
        assert_eq!(bishop_rays(Square::A1).len(), 7);
        assert_eq!(queen_rays(Square::D4), bishop_rays(Square::D4) | rook_rays(Square::D4));
    }

    #[test]
    fn line_segments() {
        assert_eq!(line(Square::C3, Square::C3), Bitboard::from(Square::C3));
        assert!(line(Square::A1, Square::H8).contains(Square::D4));
        assert_eq!(line(Square::A1, Square::H8).len(), 8);
        assert_eq!(line(Square::B1, Square::C3), Bitboard::EMPTY);
        assert_eq!(line(Square::E4, Square::E6), line(Square::E6, Square::E4));
    }
}
