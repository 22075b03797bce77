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

//! Squares, which identify one of the 64 positions on a chess board.

use super::Bitboard;

use std::{
    convert::TryFrom,
    fmt::{Display, Formatter},
    mem::transmute,
};

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[rustfmt::skip]
/// A square: an integer from 0 to 63 identifying one position on the board,
/// numbered so that `square = 8 * rank + file`.
/// A1 is 0, B1 is 1, and H8 is 63.
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}

impl Square {
    /// Create a `Square` from the given rank and file, each running from 0
    /// through 7. Out-of-range inputs give `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use heron::base::Square;
    ///
    /// assert_eq!(Square::new(0, 4), Some(Square::E1));
    /// assert_eq!(Square::new(8, 0), None);
    /// ```
    #[must_use]
    pub fn new(rank: u8, file: u8) -> Option<Square> {
        if rank < 8 && file < 8 {
            Some(unsafe { transmute::<u8, Square>((rank << 3) | file) })
        } else {
            None
        }
    }

    #[must_use]
    /// Get the integer representing the file (0 -> A, ..., 7 -> H) of this
    /// square.
    pub const fn file(self) -> u8 {
        self as u8 & 7
    }

    #[must_use]
    /// Get the integer representing the rank (0 -> 1, ..., 7 -> 8) of this
    /// square.
    pub const fn rank(self) -> u8 {
        self as u8 >> 3
    }

    #[must_use]
    /// Get the vertical mirror of this square, i.e. the square as seen from
    /// the other player's point of view.
    ///
    /// # Examples
    ///
    /// ```
    /// use heron::base::Square;
    ///
    /// assert_eq!(Square::E2.flipped(), Square::E7);
    /// ```
    pub const fn flipped(self) -> Square {
        unsafe { transmute::<u8, Square>(self as u8 ^ 56) }
    }

    #[must_use]
    /// Get the number of files between this square and `rhs`.
    pub const fn file_distance(self, rhs: Square) -> u8 {
        self.file().abs_diff(rhs.file())
    }

    #[must_use]
    /// Get the number of ranks between this square and `rhs`.
    pub const fn rank_distance(self, rhs: Square) -> u8 {
        self.rank().abs_diff(rhs.rank())
    }

    /// Convert an algebraic string (such as "e7") to a square.
    /// The file must be lowercase.
    ///
    /// # Errors
    ///
    /// Returns an `Err` describing the failure if `s` does not name a square.
    pub fn from_algebraic(s: &str) -> Result<Square, &'static str> {
        let mut chars = s.chars();
        let file_chr = chars.next().ok_or("empty string given for square")?;
        let rank_chr = chars.next().ok_or("square name must be 2 characters")?;
        if chars.next().is_some() {
            return Err("square name must be 2 characters");
        }
        let file = match file_chr {
            'a'..='h' => file_chr as u8 - b'a',
            _ => return Err("illegal file for square"),
        };
        let rank = match rank_chr {
            '1'..='8' => rank_chr as u8 - b'1',
            _ => return Err("illegal rank for square"),
        };
        // will not fail because the rank and file were validated above
        Ok(Square::new(rank, file).unwrap())
    }

    /// Unsafely convert a `Bitboard` to the `Square` of its lowest occupied
    /// bit.
    ///
    /// # Safety
    ///
    /// This function results in undefined behavior if `bb` is equal to
    /// `Bitboard::EMPTY`.
    #[must_use]
    pub unsafe fn unsafe_from(bb: Bitboard) -> Square {
        #[allow(clippy::cast_possible_truncation)]
        transmute(bb.trailing_zeros() as u8)
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

impl TryFrom<Bitboard> for Square {
    type Error = &'static str;

    /// Create the square of the lowest occupied bit of the given bitboard.
    fn try_from(bb: Bitboard) -> Result<Square, Self::Error> {
        #[allow(clippy::cast_possible_truncation)]
        Square::try_from(bb.trailing_zeros() as u8)
    }
}

impl TryFrom<u8> for Square {
    type Error = &'static str;

    fn try_from(x: u8) -> Result<Square, Self::Error> {
        if x <= Square::H8 as u8 {
            // SAFETY: x has been checked to be in the range of valid squares.
            Ok(unsafe { transmute::<u8, Square>(x) })
        } else {
            Err("input for square conversion is out of bounds")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic_round_trip() {
        assert_eq!(Square::from_algebraic("e4"), Ok(Square::E4));
        assert_eq!(Square::from_algebraic("f7"), Ok(Square::F7));
        assert_eq!(Square::E4.to_string(), "e4");
    }

    #[test]
    fn bad_algebraic() {
        assert!(Square::from_algebraic("i9").is_err());
        assert!(Square::from_algebraic("e").is_err());
        assert!(Square::from_algebraic("e44").is_err());
    }

    #[test]
    fn rank_and_file() {
        assert_eq!(Square::C7.file(), 2);
        assert_eq!(Square::C7.rank(), 6);
        assert_eq!(Square::new(6, 2), Some(Square::C7));
    }

    #[test]
    fn flip() {
        assert_eq!(Square::A1.flipped(), Square::A8);
        assert_eq!(Square::D4.flipped(), Square::D5);
    }
}
