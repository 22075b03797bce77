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

//! Pieces, which contain no information about their color or current square.

use std::fmt::{Display, Formatter, Result};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
/// The type of a piece.
/// This contains no information about the location of a piece, or of its
/// color.
///
/// The ordering of elements of this enumeration is intentional: the first
/// four pieces (knight, bishop, rook, and queen) are all valid promotion
/// types, which allows a promotion to be packed into two bits.
pub enum Piece {
    /// A knight, which can move in an L-shape.
    Knight = 0,
    /// A bishop, which can move arbitrarily far diagonally.
    Bishop,
    /// A rook, which can move arbitrarily far horizontally or vertically.
    Rook,
    /// A queen, which can move like both a rook and a bishop.
    Queen,
    /// A pawn, which can only push forward and capture diagonally.
    Pawn,
    /// A king, whose survival decides the game.
    King,
}

impl Piece {
    /// Total number of piece types.
    pub const NUM: usize = 6;

    /// Array containing all piece types.
    pub const ALL: [Piece; Piece::NUM] = [
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::Pawn,
        Piece::King,
    ];

    /// The types of pieces that a pawn can be promoted to.
    pub const PROMOTING: [Piece; 4] = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

    #[must_use]
    /// Get the conventional centipawn value of this piece, as used for
    /// material counting and exchange estimation.
    /// The king's value is large enough that no exchange sequence can make up
    /// for losing it.
    pub const fn value(self) -> i32 {
        match self {
            Piece::Pawn => 100,
            Piece::Knight | Piece::Bishop => 300,
            Piece::Rook => 500,
            Piece::Queen => 900,
            Piece::King => 1_000_000,
        }
    }

    #[must_use]
    /// Get the FEN code of this piece as an uppercase character.
    pub const fn code(self) -> char {
        match self {
            Piece::Knight => 'N',
            Piece::Bishop => 'B',
            Piece::Rook => 'R',
            Piece::Queen => 'Q',
            Piece::Pawn => 'P',
            Piece::King => 'K',
        }
    }

    #[must_use]
    /// Given an uppercase FEN character, convert it to a piece type.
    pub const fn from_code(c: char) -> Option<Piece> {
        match c {
            'N' => Some(Piece::Knight),
            'B' => Some(Piece::Bishop),
            'R' => Some(Piece::Rook),
            'Q' => Some(Piece::Queen),
            'P' => Some(Piece::Pawn),
            'K' => Some(Piece::King),
            _ => None,
        }
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trip() {
        for pt in Piece::ALL {
            assert_eq!(Piece::from_code(pt.code()), Some(pt));
        }
        assert_eq!(Piece::from_code('x'), None);
    }

    #[test]
    fn minor_values_match() {
        assert_eq!(Piece::Knight.value(), Piece::Bishop.value());
    }
}
