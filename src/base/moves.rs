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

//! Definitions of moves, which can describe any legal playable move.

use super::{CastleRights, Piece, Square};

use std::{
    fmt::{Debug, Display, Formatter},
    mem::transmute,
};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The special kinds a move can have.
/// Nearly all moves (captures and promotions included) are `Normal`.
pub enum MoveKind {
    /// An ordinary move, including captures and promotions.
    Normal = 0,
    /// A king move that also relocates a rook.
    Castling = 1,
    /// A pawn capture of a pawn that just advanced two ranks.
    EnPassant = 2,
    /// A pass of the turn, used by the search for pruning. Not legal in play.
    Null = 3,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
/// One move, packed into a single unsigned 32-bit integer.
///
/// A freshly constructed move only knows its origin, destination, promotion
/// type and kind. When the move is applied, [`Board::make_move`] fills in the
/// captured piece and the pre-move castling and en-passant state, producing a
/// completed record that [`Board::unmake_move`] can reverse exactly.
///
/// From LSB to MSB, the bits inside a `Move` are:
/// * 6 bits: origin square
/// * 6 bits: destination square
/// * 3 bits: captured piece (0 for none, else piece discriminant + 1)
/// * 3 bits: promotion piece (0 for none, else piece discriminant + 1)
/// * 4 bits: pre-move castling rights
/// * 1 bit: pre-move en-passant-legal flag
/// * 6 bits: pre-move en-passant target square
/// * 2 bits: move kind
///
/// [`Board::make_move`]: crate::base::Board::make_move
/// [`Board::unmake_move`]: crate::base::Board::unmake_move
pub struct Move(u32);

/// Bit offsets of the packed fields.
const CAPTURED_SHIFT: u32 = 12;
const PROMOTE_SHIFT: u32 = 15;
const RIGHTS_SHIFT: u32 = 18;
const EP_FLAG_SHIFT: u32 = 22;
const EP_TARGET_SHIFT: u32 = 23;
const KIND_SHIFT: u32 = 29;

/// The bits identifying what a move does on the board: origin, destination,
/// and promotion type. Two generated moves describing the same action agree
/// on exactly these bits.
const ACTION_MASK: u32 = 0x0003_8FFF;

impl Move {
    /// A sentinel for "no move": origin and destination are both A1.
    /// Returned by the search when a position has no legal moves.
    pub const NONE: Move = Move(0);

    #[must_use]
    /// Create a `Move` with no promotion type and no special kind.
    pub const fn new(origin: Square, destination: Square) -> Move {
        Move(((destination as u32) << 6) | origin as u32)
    }

    #[must_use]
    /// Create a `Move` with the given promotion type.
    /// The promote type must not be a pawn or a king.
    pub const fn promoting(origin: Square, destination: Square, promote_type: Piece) -> Move {
        Move(Move::new(origin, destination).0 | ((promote_type as u32 + 1) << PROMOTE_SHIFT))
    }

    #[must_use]
    /// Create a `Move` which is tagged as a castling move.
    pub const fn castling(origin: Square, destination: Square) -> Move {
        Move(Move::new(origin, destination).0 | ((MoveKind::Castling as u32) << KIND_SHIFT))
    }

    #[must_use]
    /// Create a `Move` which is tagged as an en-passant capture.
    pub const fn en_passant(origin: Square, destination: Square) -> Move {
        Move(Move::new(origin, destination).0 | ((MoveKind::EnPassant as u32) << KIND_SHIFT))
    }

    #[must_use]
    /// Create a null move, which passes the turn without touching a piece.
    pub const fn null() -> Move {
        Move((MoveKind::Null as u32) << KIND_SHIFT)
    }

    #[must_use]
    /// Get the square that a piece moves from to execute this move.
    pub const fn origin(self) -> Square {
        // SAFETY: masking out the upper bits keeps the value in 0..64.
        unsafe { transmute::<u8, Square>((self.0 & 63) as u8) }
    }

    #[must_use]
    /// Get the target square of this move.
    pub const fn destination(self) -> Square {
        // SAFETY: masking out the other bits keeps the value in 0..64.
        unsafe { transmute::<u8, Square>(((self.0 >> 6) & 63) as u8) }
    }

    #[must_use]
    /// Get the kind of this move.
    pub const fn kind(self) -> MoveKind {
        // SAFETY: the two kind bits cover exactly the four variants.
        unsafe { transmute::<u8, MoveKind>(((self.0 >> KIND_SHIFT) & 3) as u8) }
    }

    #[must_use]
    /// Get the promotion type of this move, if any.
    pub const fn promote_type(self) -> Option<Piece> {
        decode_piece((self.0 >> PROMOTE_SHIFT) & 7)
    }

    #[must_use]
    /// Get the piece captured by this move.
    /// Only meaningful on a record completed by `make_move`; en-passant
    /// captures record a pawn.
    pub const fn captured(self) -> Option<Piece> {
        decode_piece((self.0 >> CAPTURED_SHIFT) & 7)
    }

    #[must_use]
    /// Determine whether this move is a sentinel, i.e. whether its origin and
    /// destination coincide. Null moves and [`Move::NONE`] both qualify.
    pub const fn is_sentinel(self) -> bool {
        (self.0 & 63) == ((self.0 >> 6) & 63)
    }

    #[must_use]
    /// Determine whether this move performs the same action as `other`:
    /// same origin, destination and promotion type, ignoring the bookkeeping
    /// fields filled in by `make_move`.
    pub const fn same_action(self, other: Move) -> bool {
        (self.0 & ACTION_MASK) == (other.0 & ACTION_MASK)
    }

    #[must_use]
    /// Get the castling rights that were in effect before this move was made.
    pub(crate) const fn prior_rights(self) -> CastleRights {
        CastleRights(((self.0 >> RIGHTS_SHIFT) & 15) as u8)
    }

    #[must_use]
    /// Get the en-passant target that was in effect before this move was
    /// made: the square of the pawn that had just advanced two ranks.
    pub(crate) const fn prior_en_passant(self) -> Option<Square> {
        if (self.0 >> EP_FLAG_SHIFT) & 1 == 0 {
            None
        } else {
            // SAFETY: the six target bits are always in 0..64.
            Some(unsafe { transmute::<u8, Square>(((self.0 >> EP_TARGET_SHIFT) & 63) as u8) })
        }
    }

    /// Record the pre-move castling rights and en-passant state into this
    /// move, so that `unmake_move` can restore them.
    pub(crate) fn record_prior(&mut self, rights: CastleRights, en_passant: Option<Square>) {
        let mask = (15 << RIGHTS_SHIFT) | (1 << EP_FLAG_SHIFT) | (63 << EP_TARGET_SHIFT);
        self.0 &= !mask;
        self.0 |= u32::from(rights.0) << RIGHTS_SHIFT;
        if let Some(sq) = en_passant {
            self.0 |= (1 << EP_FLAG_SHIFT) | ((sq as u32) << EP_TARGET_SHIFT);
        }
    }

    /// Record the piece captured by this move.
    pub(crate) fn record_captured(&mut self, captured: Option<Piece>) {
        self.0 &= !(7 << CAPTURED_SHIFT);
        self.0 |= encode_piece(captured) << CAPTURED_SHIFT;
    }

    /// Overwrite the kind of this move.
    /// Used when a degenerate move (origin equal to destination) collapses
    /// into a null move.
    pub(crate) fn set_kind(&mut self, kind: MoveKind) {
        self.0 &= !(3 << KIND_SHIFT);
        self.0 |= (kind as u32) << KIND_SHIFT;
    }

    /// Overwrite the promotion type of this move.
    /// Used to fan a generated pawn move out into its four promotions.
    pub(crate) fn set_promote_type(&mut self, promote_type: Option<Piece>) {
        self.0 &= !(7 << PROMOTE_SHIFT);
        self.0 |= encode_piece(promote_type) << PROMOTE_SHIFT;
    }

    /// Parse the wire form of a move: origin and destination in
    /// file-letter/rank-digit form, optionally followed by one promotion
    /// letter in {N, B, R, Q} (either case).
    ///
    /// The result is the bare (origin, destination, promotion) description;
    /// the caller matches it against the legal moves of a position.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if `s` is not a well-formed wire move.
    pub fn parse_wire(s: &str) -> Result<(Square, Square, Option<Piece>), &'static str> {
        if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
            return Err("wire move must be 4 or 5 characters");
        }
        let origin = Square::from_algebraic(&s[0..2])?;
        let destination = Square::from_algebraic(&s[2..4])?;
        let promotion = match s.chars().nth(4) {
            None => None,
            Some(c) => match Piece::from_code(c.to_ascii_uppercase()) {
                Some(p @ (Piece::Knight | Piece::Bishop | Piece::Rook | Piece::Queen)) => Some(p),
                _ => return Err("invalid promotion letter"),
            },
        };
        Ok((origin, destination, promotion))
    }

    #[must_use]
    /// Construct the wire-form string of this move, e.g. `e2e4` or `e7e8Q`.
    pub fn to_wire(self) -> String {
        match self.promote_type() {
            None => format!("{}{}", self.origin(), self.destination()),
            Some(p) => format!("{}{}{}", self.origin(), self.destination(), p.code()),
        }
    }
}

/// Decode a 3-bit piece field: 0 is no piece, else discriminant + 1.
const fn decode_piece(bits: u32) -> Option<Piece> {
    if bits == 0 {
        None
    } else {
        // SAFETY: bits is in 1..=7, so bits - 1 is a valid discriminant as
        // long as encode_piece was used to produce it.
        Some(unsafe { transmute::<u8, Piece>((bits - 1) as u8) })
    }
}

/// Encode a piece into a 3-bit field: 0 for no piece, else discriminant + 1.
const fn encode_piece(piece: Option<Piece>) -> u32 {
    match piece {
        None => 0,
        Some(p) => p as u32 + 1,
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.origin(), self.destination())?;
        if let Some(pt) = self.promote_type() {
            write!(f, "{}", pt.code())?;
        }
        match self.kind() {
            MoveKind::EnPassant => write!(f, " [e.p.]")?,
            MoveKind::Castling => write!(f, " [castle]")?,
            MoveKind::Null => write!(f, " [null]")?,
            MoveKind::Normal => (),
        }
        Ok(())
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.promote_type() {
            None => write!(f, "{} -> {}", self.origin(), self.destination()),
            Some(p) => write!(f, "{} -> {} ={p}", self.origin(), self.destination()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_round_trip() {
        let m = Move::promoting(Square::B7, Square::A8, Piece::Queen);
        assert_eq!(m.origin(), Square::B7);
        assert_eq!(m.destination(), Square::A8);
        assert_eq!(m.promote_type(), Some(Piece::Queen));
        assert_eq!(m.kind(), MoveKind::Normal);
        assert_eq!(m.captured(), None);
    }

    #[test]
    fn prior_state_round_trip() {
        let mut m = Move::new(Square::E2, Square::E4);
        m.record_prior(CastleRights::WHITE, Some(Square::D5));
        m.record_captured(Some(Piece::Rook));
        assert_eq!(m.prior_rights(), CastleRights::WHITE);
        assert_eq!(m.prior_en_passant(), Some(Square::D5));
        assert_eq!(m.captured(), Some(Piece::Rook));
        // the action is unaffected by bookkeeping
        assert!(m.same_action(Move::new(Square::E2, Square::E4)));
    }

    #[test]
    fn same_action_distinguishes_promotions() {
        let q = Move::promoting(Square::B7, Square::B8, Piece::Queen);
        let n = Move::promoting(Square::B7, Square::B8, Piece::Knight);
        assert!(!q.same_action(n));
    }

    #[test]
    fn sentinels() {
        assert!(Move::NONE.is_sentinel());
        assert!(Move::null().is_sentinel());
        assert!(!Move::new(Square::E2, Square::E4).is_sentinel());
    }

    #[test]
    fn wire_form() {
        assert_eq!(
            Move::parse_wire("e2e4"),
            Ok((Square::E2, Square::E4, None))
        );
        assert_eq!(
            Move::parse_wire("e7e8q"),
            Ok((Square::E7, Square::E8, Some(Piece::Queen)))
        );
        assert!(Move::parse_wire("e7e8k").is_err());
        assert!(Move::parse_wire("e2").is_err());
        assert_eq!(
            Move::promoting(Square::E7, Square::E8, Piece::Queen).to_wire(),
            "e7e8Q"
        );
    }
}
