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

//! Hash key generation for board positions.
//!
//! The position hash is the XOR over one key per (color, piece, square)
//! placement. Castling rights, the en-passant state and the side to move are
//! deliberately not part of the hash; the transposition table stores the side
//! to move in each entry instead and matches on it during lookup.
//!
//! Keys come from a fixed linear congruential generator so that the hash of
//! any given placement is identical across runs and threads, which keeps a
//! shared transposition table coherent between the searching and pondering
//! workers.

use super::{Color, Piece, Square};

/// Multiplier of the key generator.
const MULTIPLIER: u64 = 0x5d58_8b65_6c07_8965;
/// Increment of the key generator.
const INCREMENT: u64 = 0x0000_0000_0026_9ec3;

/// One key per (color, piece, square) placement, drawn from the generator in
/// that index order with seed 1.
const KEYS: [[[u64; 64]; Piece::NUM]; 2] = {
    let mut keys = [[[0; 64]; Piece::NUM]; 2];
    let mut seed: u64 = 1;
    let mut color = 0;
    while color < 2 {
        let mut piece = 0;
        while piece < Piece::NUM {
            let mut sq = 0;
            while sq < 64 {
                seed = seed.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
                keys[color][piece][sq] = seed;
                sq += 1;
            }
            piece += 1;
        }
        color += 1;
    }
    keys
};

#[inline(always)]
/// Get the key for a given square, piece type, and color.
/// An empty square keys to 0.
pub fn square_key(sq: Square, pt: Option<Piece>, color: Color) -> u64 {
    match pt {
        None => 0,
        // SAFETY: square, piece, and color are all enums with fixed ranges,
        // so these indices are always in bounds.
        Some(p) => unsafe {
            *KEYS
                .get_unchecked(color as usize)
                .get_unchecked(p as usize)
                .get_unchecked(sq as usize)
        },
    }
}
