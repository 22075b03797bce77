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

//! The board state: piece placement, derived occupancy views, castling and
//! en-passant state, and the machinery to make and unmake moves.

use super::{
    game::GameRecord,
    movegen::{
        anti_diag_attacks, bishop_rays, diag_attacks, file_attacks, king_moves, knight_moves,
        line, pawn_attacks, rank_attacks, rook_rays, rot135, rot45, rot90,
    },
    zobrist, Bitboard, CastleRights, Color, Move, MoveKind, Piece, Square,
};

use std::{
    fmt::{Display, Formatter},
    ops::Index,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// A representation of a chess position. Does not know about history, and so
/// cannot detect repetitions; [`Game`](crate::base::Game) layers that on top.
///
/// Alongside the piece sets, a `Board` carries three rotated copies of the
/// occupancy, each aligning one sliding-ray direction with the byte grid so
/// that ray attacks are a table lookup away.
pub struct Board {
    /// The squares occupied by (in order) knights, bishops, rooks, queens,
    /// pawns, and kings.
    pieces: [Bitboard; Piece::NUM],
    /// The squares occupied by White and Black pieces, respectively.
    sides: [Bitboard; 2],
    /// What stands on each square, for O(1) piece-at-square queries.
    mailbox: [Option<(Piece, Color)>; 64],
    /// The occupancy rotated 45° left (a1–h8 diagonals contiguous).
    occupancy45: Bitboard,
    /// The occupancy rotated 90° left (files contiguous).
    occupancy90: Bitboard,
    /// The occupancy rotated 135° left (a8–h1 diagonals contiguous).
    occupancy135: Bitboard,
    /// The squares the kings live on, White first.
    king_sqs: [Square; 2],
    /// The color of the player to move.
    pub player: Color,
    /// The remaining castling rights of both players.
    pub castle_rights: CastleRights,
    /// The square of the pawn which just advanced two ranks, making it
    /// capturable en passant. `None` after any other move.
    pub en_passant_target: Option<Square>,
    /// Whether each side has actually castled (as opposed to merely losing
    /// its rights), White first.
    castled: [bool; 2],
    /// The position hash: the XOR over one Zobrist key per placement.
    /// Castling, en-passant and side-to-move state are not hashed; the
    /// transposition table stores the side to move separately.
    pub hash: u64,
}

impl Board {
    #[must_use]
    /// Construct a `Board` in the standard chess starting position.
    pub fn new() -> Board {
        let mut board = Board {
            pieces: [
                Bitboard::new(0x4200_0000_0000_0042), // knight
                Bitboard::new(0x2400_0000_0000_0024), // bishop
                Bitboard::new(0x8100_0000_0000_0081), // rook
                Bitboard::new(0x0800_0000_0000_0008), // queen
                Bitboard::new(0x00FF_0000_0000_FF00), // pawn
                Bitboard::new(0x1000_0000_0000_0010), // king
            ],
            sides: [
                Bitboard::new(0x0000_0000_0000_FFFF), // white
                Bitboard::new(0xFFFF_0000_0000_0000), // black
            ],
            mailbox: [None; 64],
            occupancy45: Bitboard::EMPTY,
            occupancy90: Bitboard::EMPTY,
            occupancy135: Bitboard::EMPTY,
            king_sqs: [Square::E1, Square::E8],
            player: Color::White,
            castle_rights: CastleRights::ALL,
            en_passant_target: None,
            castled: [false; 2],
            hash: 0,
        };
        board.refresh_derived();
        board
    }

    /// Load a `Board` from a FEN string.
    /// The halfmove clock and fullmove number are accepted but ignored, and
    /// may be absent; the board itself does not track them.
    ///
    /// # Errors
    ///
    /// Will return an `Err` describing the problem if the FEN is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use heron::base::Board;
    ///
    /// let fen_board = Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")?;
    /// assert_eq!(fen_board, Board::new());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_fen(fen: &str) -> Result<Board, &'static str> {
        let mut board = Board {
            pieces: [Bitboard::EMPTY; Piece::NUM],
            sides: [Bitboard::EMPTY; 2],
            mailbox: [None; 64],
            occupancy45: Bitboard::EMPTY,
            occupancy90: Bitboard::EMPTY,
            occupancy135: Bitboard::EMPTY,
            king_sqs: [Square::A1; 2],
            player: Color::White,
            castle_rights: CastleRights::NONE,
            en_passant_target: None,
            castled: [false; 2],
            hash: 0,
        };

        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or("empty FEN")?;
        let mut rank = 7u8;
        let mut file = 0u8;
        for chr in placement.chars() {
            match chr {
                '/' => {
                    if file != 8 || rank == 0 {
                        return Err("malformed rank in FEN piece placement");
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => file += chr as u8 - b'0',
                _ => {
                    let color = if chr.is_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let pt = Piece::from_code(chr.to_ascii_uppercase())
                        .ok_or("unrecognized piece character in FEN")?;
                    let sq = Square::new(rank, file).ok_or("FEN rank has too many squares")?;
                    board.sides[color as usize].insert(sq);
                    board.pieces[pt as usize].insert(sq);
                    file += 1;
                }
            }
        }
        if rank != 0 || file != 8 {
            return Err("FEN piece placement ended early");
        }

        board.player = match fields.next() {
            Some("w") => Color::White,
            Some("b") => Color::Black,
            _ => return Err("unrecognized player to move"),
        };

        let castling = fields.next().ok_or("missing castling field")?;
        if castling != "-" {
            for chr in castling.chars() {
                board.castle_rights |= match chr {
                    'K' => CastleRights::WHITE_KINGSIDE,
                    'Q' => CastleRights::WHITE_QUEENSIDE,
                    'k' => CastleRights::BLACK_KINGSIDE,
                    'q' => CastleRights::BLACK_QUEENSIDE,
                    _ => return Err("unrecognized castling character"),
                };
            }
        }

        let ep = fields.next().ok_or("missing en passant field")?;
        if ep != "-" {
            // FEN names the square passed over; the board stores the pawn
            // itself, which stands one rank beyond it.
            let passed = Square::from_algebraic(ep)?;
            let target_rank = match board.player {
                Color::White => passed.rank().checked_sub(1),
                Color::Black => Some(passed.rank() + 1),
            };
            board.en_passant_target = target_rank
                .and_then(|r| Square::new(r, passed.file()))
                .ok_or("en passant square on an impossible rank")
                .map(Some)?;
        }

        // halfmove clock and fullmove number, if present, are not board state

        if (board.kings() & board.white()).len() != 1
            || (board.kings() & board.black()).len() != 1
        {
            return Err("each side must have exactly one king");
        }
        board.refresh_derived();
        Ok(board)
    }

    #[must_use]
    /// Restore a playable `Board` from a frozen game record.
    pub fn from_record(record: &GameRecord) -> Board {
        let mut board = Board {
            pieces: [Bitboard::EMPTY; Piece::NUM],
            sides: [Bitboard::EMPTY; 2],
            mailbox: [None; 64],
            occupancy45: Bitboard::EMPTY,
            occupancy90: Bitboard::EMPTY,
            occupancy135: Bitboard::EMPTY,
            king_sqs: [Square::A1; 2],
            player: record.player,
            castle_rights: record.castle_rights,
            en_passant_target: record.en_passant_target,
            castled: record.castled,
            hash: 0,
        };
        for color in Color::ALL {
            for pt in Piece::ALL {
                let placement = record.placement(color, pt);
                board.pieces[pt as usize] |= placement;
                board.sides[color as usize] |= placement;
            }
        }
        board.refresh_derived();
        debug_assert_eq!(board.hash, record.hash);
        board
    }

    /// Recompute every derived field (mailbox, rotated occupancies, king
    /// squares, hash) from the piece and side bitboards.
    fn refresh_derived(&mut self) {
        self.mailbox = [None; 64];
        self.occupancy45 = Bitboard::EMPTY;
        self.occupancy90 = Bitboard::EMPTY;
        self.occupancy135 = Bitboard::EMPTY;
        self.hash = 0;
        for color in Color::ALL {
            for pt in Piece::ALL {
                for sq in self.pieces[pt as usize] & self.sides[color as usize] {
                    self.mailbox[sq as usize] = Some((pt, color));
                    self.hash ^= zobrist::square_key(sq, Some(pt), color);
                    if pt == Piece::King {
                        self.king_sqs[color as usize] = sq;
                    }
                }
            }
        }
        for sq in self.occupancy() {
            self.occupancy45 |= Bitboard::new(1 << rot45(sq));
            self.occupancy90 |= Bitboard::new(1 << rot90(sq));
            self.occupancy135 |= Bitboard::new(1 << rot135(sq));
        }
    }

    #[must_use]
    /// Get the squares occupied by pieces of either color.
    pub fn occupancy(&self) -> Bitboard {
        self.sides[0] | self.sides[1]
    }

    #[must_use]
    /// Get a bitboard of all the squares occupied by pieces of the given
    /// color.
    pub fn by_color(&self, color: Color) -> Bitboard {
        // SAFETY: there are exactly as many colors as indices on `sides`.
        unsafe { *self.sides.get_unchecked(color as usize) }
    }

    #[must_use]
    /// Get a bitboard of all the squares occupied by a given piece type.
    pub fn by_piece(&self, pt: Piece) -> Bitboard {
        // SAFETY: there are exactly as many piece types as indices on
        // `pieces`.
        unsafe { *self.pieces.get_unchecked(pt as usize) }
    }

    #[must_use]
    /// Get a bitboard of all the knights on the board.
    pub const fn knights(&self) -> Bitboard {
        self.pieces[Piece::Knight as usize]
    }

    #[must_use]
    /// Get a bitboard of all the bishops on the board.
    pub const fn bishops(&self) -> Bitboard {
        self.pieces[Piece::Bishop as usize]
    }

    #[must_use]
    /// Get a bitboard of all the rooks on the board.
    pub const fn rooks(&self) -> Bitboard {
        self.pieces[Piece::Rook as usize]
    }

    #[must_use]
    /// Get a bitboard of all the queens on the board.
    pub const fn queens(&self) -> Bitboard {
        self.pieces[Piece::Queen as usize]
    }

    #[must_use]
    /// Get a bitboard of all the pawns on the board.
    pub const fn pawns(&self) -> Bitboard {
        self.pieces[Piece::Pawn as usize]
    }

    #[must_use]
    /// Get a bitboard of both kings on the board.
    pub const fn kings(&self) -> Bitboard {
        self.pieces[Piece::King as usize]
    }

    #[must_use]
    /// Get a bitboard of all the white pieces.
    pub const fn white(&self) -> Bitboard {
        self.sides[Color::White as usize]
    }

    #[must_use]
    /// Get a bitboard of all the black pieces.
    pub const fn black(&self) -> Bitboard {
        self.sides[Color::Black as usize]
    }

    #[must_use]
    /// Get the square the given color's king lives on.
    pub const fn king_sq(&self, color: Color) -> Square {
        self.king_sqs[color as usize]
    }

    #[must_use]
    /// Has the given color castled in this game?
    /// Losing the right to castle does not count.
    pub const fn has_castled(&self, color: Color) -> bool {
        self.castled[color as usize]
    }

    #[must_use]
    /// Get the squares a bishop on `sq` attacks through the current
    /// occupancy, first blockers included.
    pub fn bishop_attacks(&self, sq: Square) -> Bitboard {
        diag_attacks(sq, self.occupancy45) | anti_diag_attacks(sq, self.occupancy135)
    }

    #[must_use]
    /// Get the squares a rook on `sq` attacks through the current occupancy,
    /// first blockers included.
    pub fn rook_attacks(&self, sq: Square) -> Bitboard {
        rank_attacks(sq, self.occupancy()) | file_attacks(sq, self.occupancy90)
    }

    #[must_use]
    /// Get the squares a queen on `sq` attacks through the current occupancy,
    /// first blockers included.
    pub fn queen_attacks(&self, sq: Square) -> Bitboard {
        self.bishop_attacks(sq) | self.rook_attacks(sq)
    }

    #[must_use]
    /// Determine whether `side` attacks `sq`.
    pub fn is_attacked(&self, sq: Square, side: Color) -> bool {
        if !(pawn_attacks(!side, sq) & self.pawns() & self.by_color(side)).is_empty() {
            return true;
        }
        if !(knight_moves(sq) & self.knights() & self.by_color(side)).is_empty() {
            return true;
        }
        let diag_sliders = (self.bishops() | self.queens()) & self.by_color(side);
        if !(self.bishop_attacks(sq) & diag_sliders).is_empty() {
            return true;
        }
        let line_sliders = (self.rooks() | self.queens()) & self.by_color(side);
        if !(self.rook_attacks(sq) & line_sliders).is_empty() {
            return true;
        }
        !(king_moves(sq) & self.kings() & self.by_color(side)).is_empty()
    }

    #[must_use]
    /// Determine whether the given side's king is in check.
    pub fn is_checked(&self, side: Color) -> bool {
        self.is_attacked(self.king_sq(side), !side)
    }

    #[must_use]
    /// Get the pieces of `side` which attack `target`, including sliders
    /// which would attack it once the pieces in front of them move (X-ray
    /// attackers). A rear slider counts if nothing but previously-found
    /// attackers and same-direction sliders stand between it and the target.
    pub fn attackers_to(&self, target: Square, side: Color) -> Bitboard {
        let ours = self.by_color(side);
        let mut attackers = pawn_attacks(!side, target) & self.pawns() & ours;
        attackers |= knight_moves(target) & self.knights() & ours;
        attackers |= king_moves(target) & self.kings() & ours;

        let queens = self.queens();
        let candidate_sets = [
            (bishop_rays(target), (self.bishops() | queens) & ours),
            (rook_rays(target), (self.rooks() | queens) & ours),
        ];
        for (rays, sliders) in candidate_sets {
            let line_attackers = rays & sliders;
            if line_attackers.is_empty() {
                continue;
            }
            let blockers = self.occupancy() & !(attackers | line_attackers);
            for attacker_sq in line_attackers {
                let between = line(target, attacker_sq)
                    & !(Bitboard::from(target) | Bitboard::from(attacker_sq));
                if (between & blockers).is_empty() {
                    attackers.insert(attacker_sq);
                }
            }
        }

        attackers
    }

    #[must_use]
    /// Get the material balance in centipawns from `side`'s point of view.
    pub fn material(&self, side: Color) -> i32 {
        let mut diff = 0;
        for pt in Piece::ALL {
            let white_count = i32::from((self.by_piece(pt) & self.white()).len());
            let black_count = i32::from((self.by_piece(pt) & self.black()).len());
            diff += pt.value() * (white_count - black_count);
        }
        match side {
            Color::White => diff,
            Color::Black => -diff,
        }
    }

    #[must_use]
    /// Determine whether `side` has enough material left to deliver mate:
    /// any pawn, rook or queen, or at least two minor pieces.
    pub fn has_sufficient_material(&self, side: Color) -> bool {
        let ours = self.by_color(side);
        if !((self.pawns() | self.rooks() | self.queens()) & ours).is_empty() {
            return true;
        }
        ((self.knights() | self.bishops()) & ours).len() >= 2
    }

    #[must_use]
    /// Determine whether this position is an endgame: at most four pieces
    /// which are neither kings nor pawns remain on the board.
    pub fn is_endgame(&self) -> bool {
        (self.occupancy() & !(self.kings() | self.pawns())).len() <= 4
    }

    /// Apply a move to the board and return the completed record of it,
    /// which carries the captured piece and the pre-move castling and
    /// en-passant state needed by [`Board::unmake_move`].
    ///
    /// The move must be pseudo-legal; whether it leaves the mover's own king
    /// attacked is for the caller to test afterwards. A move whose origin
    /// equals its destination degenerates to a null move: only the turn (and
    /// the en-passant state) changes.
    pub fn make_move(&mut self, m: Move) -> Move {
        let mut m = m;
        m.record_prior(self.castle_rights, self.en_passant_target);

        let player = self.player;
        // the turn passes unconditionally, null moves included
        self.player = !self.player;

        let origin = m.origin();
        let dest = m.destination();
        if m.kind() == MoveKind::Null || origin == dest {
            m.set_kind(MoveKind::Null);
            self.en_passant_target = None;
            return m;
        }

        match m.kind() {
            MoveKind::Castling => {
                self.move_piece(origin, dest);
                let rank = origin.rank();
                let (rook_origin_file, rook_dest_file) = if dest.file() == 6 {
                    (7, 5) // the H rook comes to F for a short castle
                } else {
                    (0, 3) // the A rook comes to D for a long castle
                };
                self.move_piece(
                    Square::new(rank, rook_origin_file).unwrap(),
                    Square::new(rank, rook_dest_file).unwrap(),
                );
                self.castled[player as usize] = true;
                self.en_passant_target = None;
            }
            MoveKind::EnPassant => {
                m.record_captured(Some(Piece::Pawn));
                let target = self.en_passant_target.unwrap();
                self.move_piece(origin, dest);
                self.remove_piece(target);
                self.en_passant_target = None;
            }
            _ => {
                m.record_captured(self.mailbox[dest as usize].map(|(pt, _)| pt));
                self.move_piece(origin, dest);
                if let Some(promote_type) = m.promote_type() {
                    self.remove_piece(dest);
                    self.add_piece(dest, promote_type, player);
                }
                if self.mailbox[dest as usize] == Some((Piece::Pawn, player))
                    && origin.rank_distance(dest) == 2
                {
                    self.en_passant_target = Some(dest);
                } else {
                    self.en_passant_target = None;
                }
            }
        }

        self.update_castle_rights();
        m
    }

    /// Revert a move made by [`Board::make_move`], restoring the position
    /// exactly, field for field. `m` must be the completed record that
    /// `make_move` returned.
    pub fn unmake_move(&mut self, m: Move) {
        self.player = !self.player;
        let player = self.player;
        self.castle_rights = m.prior_rights();
        self.en_passant_target = m.prior_en_passant();

        if m.kind() == MoveKind::Null {
            return;
        }

        let origin = m.origin();
        let dest = m.destination();
        self.move_piece(dest, origin);

        match m.kind() {
            MoveKind::Castling => {
                let rank = origin.rank();
                let (rook_origin_file, rook_dest_file) =
                    if dest.file() == 6 { (7, 5) } else { (0, 3) };
                self.move_piece(
                    Square::new(rank, rook_dest_file).unwrap(),
                    Square::new(rank, rook_origin_file).unwrap(),
                );
                self.castled[player as usize] = false;
            }
            MoveKind::EnPassant => {
                // the restored en-passant target is where the capturee stood
                let target = self.en_passant_target.unwrap();
                self.add_piece(target, Piece::Pawn, !player);
            }
            _ => {
                if let Some(capturee) = m.captured() {
                    self.add_piece(dest, capturee, !player);
                }
                if m.promote_type().is_some() {
                    self.remove_piece(origin);
                    self.add_piece(origin, Piece::Pawn, player);
                }
            }
        }
    }

    /// Clear any castling right whose king or rook has left its home square.
    /// Rights only ever decrease over the course of a game.
    fn update_castle_rights(&mut self) {
        if self.king_sq(Color::White) != Square::E1 {
            self.castle_rights &= !CastleRights::WHITE;
        }
        if self.king_sq(Color::Black) != Square::E8 {
            self.castle_rights &= !CastleRights::BLACK;
        }
        let white_rooks = self.rooks() & self.white();
        if !white_rooks.contains(Square::H1) {
            self.castle_rights &= !CastleRights::WHITE_KINGSIDE;
        }
        if !white_rooks.contains(Square::A1) {
            self.castle_rights &= !CastleRights::WHITE_QUEENSIDE;
        }
        let black_rooks = self.rooks() & self.black();
        if !black_rooks.contains(Square::H8) {
            self.castle_rights &= !CastleRights::BLACK_KINGSIDE;
        }
        if !black_rooks.contains(Square::A8) {
            self.castle_rights &= !CastleRights::BLACK_QUEENSIDE;
        }
    }

    /// Put a piece on an empty square, updating every derived view.
    fn add_piece(&mut self, sq: Square, pt: Piece, color: Color) {
        debug_assert!(self.mailbox[sq as usize].is_none());
        let mask = Bitboard::from(sq);
        self.pieces[pt as usize] |= mask;
        self.sides[color as usize] |= mask;
        self.mailbox[sq as usize] = Some((pt, color));
        self.occupancy45 |= Bitboard::new(1 << rot45(sq));
        self.occupancy90 |= Bitboard::new(1 << rot90(sq));
        self.occupancy135 |= Bitboard::new(1 << rot135(sq));
        self.hash ^= zobrist::square_key(sq, Some(pt), color);
        if pt == Piece::King {
            self.king_sqs[color as usize] = sq;
        }
    }

    /// Remove the piece on `sq`, updating every derived view.
    /// The square must be occupied.
    fn remove_piece(&mut self, sq: Square) {
        let (pt, color) = self.mailbox[sq as usize].unwrap();
        let mask = !Bitboard::from(sq);
        self.pieces[pt as usize] &= mask;
        self.sides[color as usize] &= mask;
        self.mailbox[sq as usize] = None;
        self.occupancy45 &= !Bitboard::new(1 << rot45(sq));
        self.occupancy90 &= !Bitboard::new(1 << rot90(sq));
        self.occupancy135 &= !Bitboard::new(1 << rot135(sq));
        self.hash ^= zobrist::square_key(sq, Some(pt), color);
    }

    /// Move the piece on `origin` to `dest`, capturing whatever stood there.
    fn move_piece(&mut self, origin: Square, dest: Square) {
        let (pt, color) = self.mailbox[origin as usize].unwrap();
        if self.mailbox[dest as usize].is_some() {
            self.remove_piece(dest);
        }
        self.remove_piece(origin);
        self.add_piece(dest, pt, color);
    }

    #[must_use]
    /// Audit this board: check that every derived view agrees with the piece
    /// sets. Used by tests and debug assertions.
    pub(crate) fn is_valid(&self) -> bool {
        // no piece set may overlap another, and their union must be the
        // occupancy of the two sides
        let mut all = Bitboard::EMPTY;
        for pt in Piece::ALL {
            if !(all & self.by_piece(pt)).is_empty() {
                return false;
            }
            all |= self.by_piece(pt);
        }
        if !(self.white() & self.black()).is_empty() || all != self.occupancy() {
            return false;
        }

        // the mailbox must agree with the bitboards everywhere
        for sq in Bitboard::ALL {
            let expect = Piece::ALL.into_iter().find_map(|pt| {
                Color::ALL.into_iter().find_map(|c| {
                    (self.by_piece(pt) & self.by_color(c))
                        .contains(sq)
                        .then_some((pt, c))
                })
            });
            if self.mailbox[sq as usize] != expect {
                return false;
            }
        }

        // each side has one king, known by position
        for color in Color::ALL {
            let king_bb = self.kings() & self.by_color(color);
            if !king_bb.just_one() || king_bb != Bitboard::from(self.king_sq(color)) {
                return false;
            }
        }

        // the rotated occupancies are rotations of the real one
        let mut rotated = (Bitboard::EMPTY, Bitboard::EMPTY, Bitboard::EMPTY);
        for sq in self.occupancy() {
            rotated.0 |= Bitboard::new(1 << rot45(sq));
            rotated.1 |= Bitboard::new(1 << rot90(sq));
            rotated.2 |= Bitboard::new(1 << rot135(sq));
        }
        if rotated != (self.occupancy45, self.occupancy90, self.occupancy135) {
            return false;
        }

        self.hash == self.fresh_hash()
    }

    /// Compute the hash of this board from scratch.
    fn fresh_hash(&self) -> u64 {
        let mut hash = 0;
        for sq in Bitboard::ALL {
            if let Some((pt, color)) = self.mailbox[sq as usize] {
                hash ^= zobrist::square_key(sq, Some(pt), color);
            }
        }
        hash
    }
}

impl Index<Square> for Board {
    type Output = Option<(Piece, Color)>;

    /// Get the piece and color standing on a square, if any.
    fn index(&self, sq: Square) -> &Self::Output {
        // SAFETY: there are exactly as many squares as indices on `mailbox`.
        unsafe { self.mailbox.get_unchecked(sq as usize) }
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}

impl Display for Board {
    /// Express the board as eight ranks from Black's back rank down, with
    /// White's pieces in uppercase and Black's in lowercase.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                match self[Square::new(rank, file).unwrap()] {
                    Some((pt, Color::White)) => write!(f, "{pt} ")?,
                    Some((pt, Color::Black)) => {
                        write!(f, "{} ", pt.code().to_ascii_lowercase())?;
                    }
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Play a move on a FEN-loaded board, checking validity before and
    /// after, and that unmaking restores the position field for field.
    fn move_helper(fen: &str, m: Move) -> Board {
        let mut board = Board::from_fen(fen).unwrap();
        assert!(board.is_valid());
        let original = board;
        let completed = board.make_move(m);
        assert!(board.is_valid(), "after {m}:\n{board}");
        let after = board;
        board.unmake_move(completed);
        assert_eq!(board, original, "unmake did not restore {m}");
        after
    }

    #[test]
    fn start_position() {
        let board = Board::new();
        assert!(board.is_valid());
        assert_eq!(board[Square::E1], Some((Piece::King, Color::White)));
        assert_eq!(board[Square::D8], Some((Piece::Queen, Color::Black)));
        assert_eq!(board.occupancy(), Bitboard::new(0xFFFF_0000_0000_FFFF));
        assert_eq!(board.material(Color::White), 0);
        assert!(!board.is_endgame());
    }

    #[test]
    fn play_e4() {
        let after = move_helper(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            Move::new(Square::E2, Square::E4),
        );
        assert_eq!(after[Square::E4], Some((Piece::Pawn, Color::White)));
        assert_eq!(after[Square::E2], None);
        // the double push arms en passant against the arriving pawn
        assert_eq!(after.en_passant_target, Some(Square::E4));
        assert_eq!(after.player, Color::Black);
    }

    #[test]
    fn capture_updates_hash() {
        // Scandinavian: exd5 is available
        let after = move_helper(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
            Move::new(Square::E4, Square::D5),
        );
        assert_eq!(after[Square::D5], Some((Piece::Pawn, Color::White)));
        assert!(after.is_valid());
    }

    #[test]
    fn en_passant_capture() {
        // after e4 c5 e5 d5, exd6 e.p. is legal
        let mut board =
            Board::from_fen("rnbqkbnr/pp2pppp/8/2ppP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
                .unwrap();
        assert_eq!(board.en_passant_target, Some(Square::D5));
        let original = board;
        let m = board.make_move(Move::en_passant(Square::E5, Square::D6));
        assert!(board.is_valid());
        assert_eq!(board[Square::D6], Some((Piece::Pawn, Color::White)));
        assert_eq!(board[Square::D5], None);
        assert_eq!(m.captured(), Some(Piece::Pawn));
        board.unmake_move(m);
        assert_eq!(board, original);
    }

    #[test]
    fn white_kingside_castle() {
        let after = move_helper(
            "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
            Move::castling(Square::E1, Square::G1),
        );
        assert_eq!(after[Square::G1], Some((Piece::King, Color::White)));
        assert_eq!(after[Square::F1], Some((Piece::Rook, Color::White)));
        assert_eq!(after[Square::H1], None);
        assert!(after.has_castled(Color::White));
        assert!(!after.castle_rights.any(Color::White));
        assert!(after.castle_rights.any(Color::Black));
    }

    #[test]
    fn black_queenside_castle() {
        let after = move_helper(
            "r3kbnr/pppqpppp/2npb3/8/8/2NPB3/PPPQPPPP/R3KBNR b KQkq - 6 5",
            Move::castling(Square::E8, Square::C8),
        );
        assert_eq!(after[Square::C8], Some((Piece::King, Color::Black)));
        assert_eq!(after[Square::D8], Some((Piece::Rook, Color::Black)));
        assert!(after.has_castled(Color::Black));
        assert!(!after.castle_rights.any(Color::Black));
    }

    #[test]
    fn promotion() {
        let after = move_helper(
            "8/5P2/2k5/4K3/8/8/8/8 w - - 0 1",
            Move::promoting(Square::F7, Square::F8, Piece::Queen),
        );
        assert_eq!(after[Square::F8], Some((Piece::Queen, Color::White)));
        assert_eq!(after[Square::F7], None);
        assert!((after.pawns() & after.white()).is_empty());
    }

    #[test]
    fn rook_move_loses_right() {
        let after = move_helper(
            "rnbqkbnr/pppppppp/8/8/7P/8/PPPPPPP1/RNBQKBNR w KQkq - 0 1",
            Move::new(Square::H1, Square::H3),
        );
        assert!(!after.castle_rights.kingside(Color::White));
        assert!(after.castle_rights.queenside(Color::White));
    }

    #[test]
    fn capturing_rook_removes_right() {
        // bishop takes the h8 rook
        let after = move_helper(
            "rnbqk2r/ppppnp1p/4p1pb/8/4P3/1P1P4/PBP2PPP/RN1QKBNR w KQkq - 1 5",
            Move::new(Square::B2, Square::H8),
        );
        assert!(!after.castle_rights.kingside(Color::Black));
    }

    #[test]
    fn null_move_passes_turn() {
        let mut board = Board::new();
        let original = board;
        let m = board.make_move(Move::null());
        assert_eq!(board.player, Color::Black);
        assert_eq!(board.occupancy(), original.occupancy());
        assert_eq!(board.hash, original.hash);
        board.unmake_move(m);
        assert_eq!(board, original);
    }

    #[test]
    fn null_move_clears_en_passant() {
        let mut board =
            Board::from_fen("rnbqkbnr/pp2pppp/8/2ppP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
                .unwrap();
        let original = board;
        let m = board.make_move(Move::null());
        assert_eq!(board.en_passant_target, None);
        board.unmake_move(m);
        assert_eq!(board, original);
    }

    #[test]
    fn attack_queries() {
        let board = Board::new();
        // f3 is covered by the g1 knight, the e2 and g2 pawns
        assert!(board.is_attacked(Square::F3, Color::White));
        assert!(!board.is_attacked(Square::E4, Color::White));
        assert!(!board.is_checked(Color::White));
    }

    #[test]
    fn xray_attackers() {
        // doubled heavy pieces on the e-file both attack e8
        let board = Board::from_fen("4k3/8/8/8/8/4R3/4Q3/4K3 w - - 0 1").unwrap();
        let attackers = board.attackers_to(Square::E8, Color::White);
        assert!(attackers.contains(Square::E3));
        assert!(attackers.contains(Square::E2), "queen attacks through own rook");
        assert!(!attackers.contains(Square::E1));
    }

    #[test]
    fn insufficient_material() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert!(!board.has_sufficient_material(Color::White));
        assert!(!board.has_sufficient_material(Color::Black));
        let board = Board::from_fen("4k3/8/8/8/8/8/8/1NB1K3 w - - 0 1").unwrap();
        assert!(board.has_sufficient_material(Color::White));
    }

    #[test]
    /// Play seeded random games, checking after every move that all derived
    /// state (incremental hash included) matches a from-scratch rebuild, and
    /// then unwind each game move by move, comparing bitwise against the
    /// snapshots taken on the way down.
    fn random_playout_round_trips() {
        use crate::base::movegen::{generate_legal, MoveStack};

        fastrand::seed(0x4865_726f_6e21);
        for _ in 0..20 {
            let mut board = Board::new();
            let mut snapshots = Vec::new();
            let mut undo = Vec::new();
            for _ in 0..120 {
                let mut stack = MoveStack::new();
                let n_moves = generate_legal(&mut board, &mut stack, 0);
                if n_moves == 0 {
                    break;
                }
                let m = stack.level_mut(0)[fastrand::usize(..n_moves)].m;
                stack.clear(0);

                snapshots.push(board);
                undo.push(board.make_move(m));
                assert!(board.is_valid(), "invalid after {m}:\n{board}");
            }
            while let Some(m) = undo.pop() {
                board.unmake_move(m);
                assert_eq!(board, snapshots.pop().unwrap());
            }
            assert_eq!(board, Board::new());
        }
    }

    #[test]
    fn record_round_trip() {
        let mut board = Board::new();
        for m in [
            Move::new(Square::E2, Square::E4),
            Move::new(Square::E7, Square::E5),
            Move::new(Square::G1, Square::F3),
        ] {
            board.make_move(m);
        }
        let record = GameRecord::freeze(&board, 3, 1, 1, Move::NONE);
        assert_eq!(Board::from_record(&record), board);
    }
}
