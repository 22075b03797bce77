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

//! Move generation.
//!
//! Generators come in four flavors: captures only, quiet moves only, both,
//! and fully legal moves (the generator the search falls back to when in
//! check, and the one game-level callers use). The pseudo-legal flavors do
//! not test whether the mover's king is left hanging; the search does that
//! as it tries each move.
//!
//! All generators write into a [`MoveStack`], a single arena shared by every
//! level of the search recursion. Each level's region begins where the level
//! below stopped pushing, and popping always happens from the top, so deeper
//! levels never disturb the moves of shallower ones.

mod tables;

pub use tables::{
    anti_diag_attacks, bishop_rays, diag_attacks, file_attacks, king_moves, knight_moves, line,
    pawn_attacks, pawn_double_pushes, pawn_pushes, queen_rays, rank_attacks, rook_rays,
};
pub(crate) use tables::{rot135, rot45, rot90};

use super::{Bitboard, Board, Color, Move, Piece, Square};

/// The deepest level the search recursion can reach, and therefore the
/// number of regions a move stack must hold.
pub const MAX_PLY: usize = 32;

/// Capacity of the move arena. Fits the worst-case branching factor at every
/// level of a maximal-depth search.
const ARENA_SIZE: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// A generated move along with its ordering score.
/// Scores start at zero and are filled in by the search's ordering pass.
pub struct ScoredMove {
    /// The move itself.
    pub m: Move,
    /// The ordering score: higher is searched earlier.
    pub score: i32,
}

#[derive(Clone, Debug)]
/// An arena of generated moves, partitioned into one region per search
/// level.
///
/// Two invariants hold at all times: the region for level `L + 1` starts at
/// the current top of level `L`'s region, and slots below the current level
/// are never touched by deeper recursion.
pub struct MoveStack {
    /// Every generated move, all levels concatenated.
    entries: Vec<ScoredMove>,
    /// The start of each level's region within `entries`.
    base: [usize; MAX_PLY],
}

impl MoveStack {
    #[must_use]
    /// Create an empty move stack.
    pub fn new() -> MoveStack {
        MoveStack {
            entries: Vec::with_capacity(ARENA_SIZE),
            base: [0; MAX_PLY],
        }
    }

    /// Begin generation at `level`: the level's region starts at the current
    /// top of the arena.
    fn open(&mut self, level: usize) {
        self.base[level] = self.entries.len();
    }

    /// Push a move onto `level`'s region, which must be the topmost open
    /// region. Silently drops moves beyond the arena capacity.
    fn push(&mut self, m: Move) {
        if self.entries.len() < ARENA_SIZE {
            self.entries.push(ScoredMove { m, score: 0 });
        }
    }

    #[must_use]
    /// Get the number of moves currently in `level`'s region.
    pub fn len(&self, level: usize) -> usize {
        self.entries.len() - self.base[level]
    }

    #[must_use]
    /// Determine whether `level`'s region is empty.
    pub fn is_empty(&self, level: usize) -> bool {
        self.len(level) == 0
    }

    /// Discard all moves in `level`'s region.
    pub fn clear(&mut self, level: usize) {
        self.entries.truncate(self.base[level]);
    }

    /// Get mutable access to `level`'s region, for assigning ordering scores.
    pub fn level_mut(&mut self, level: usize) -> &mut [ScoredMove] {
        let base = self.base[level];
        &mut self.entries[base..]
    }

    /// Remove and return the best-scored move of `level`'s region.
    /// The best slot is swapped to the top first, so slots below the region
    /// top are reordered but never dropped.
    pub fn pop_best(&mut self, level: usize) -> Option<ScoredMove> {
        if self.is_empty(level) {
            return None;
        }
        let base = self.base[level];
        let top = self.entries.len() - 1;
        let mut best = top;
        for i in base..top {
            if self.entries[i].score > self.entries[best].score {
                best = i;
            }
        }
        self.entries.swap(best, top);
        self.entries.pop()
    }
}

impl Default for MoveStack {
    fn default() -> MoveStack {
        MoveStack::new()
    }
}

/// Generate the moves which capture an enemy piece (en passant included)
/// into `level`'s region of the stack. Returns the number generated.
pub fn generate_captures(board: &Board, stack: &mut MoveStack, level: usize) -> usize {
    if level >= MAX_PLY {
        return 0;
    }
    stack.open(level);
    push_captures(board, stack);
    stack.len(level)
}

/// Generate the moves which do not capture (castling included) into
/// `level`'s region of the stack. Returns the number generated.
pub fn generate_quiets(board: &Board, stack: &mut MoveStack, level: usize) -> usize {
    if level >= MAX_PLY {
        return 0;
    }
    stack.open(level);
    push_quiets(board, stack);
    stack.len(level)
}

/// Generate every pseudo-legal move into `level`'s region of the stack.
/// Returns the number generated.
pub fn generate_all(board: &Board, stack: &mut MoveStack, level: usize) -> usize {
    if level >= MAX_PLY {
        return 0;
    }
    stack.open(level);
    push_quiets(board, stack);
    push_captures(board, stack);
    stack.len(level)
}

/// Generate every strictly legal move into `level`'s region of the stack:
/// each pseudo-legal candidate is played, discarded if it leaves the mover's
/// king attacked, and reverted. Returns the number generated.
///
/// When the side to move is in check, these are exactly the check evasions.
pub fn generate_legal(board: &mut Board, stack: &mut MoveStack, level: usize) -> usize {
    if level >= MAX_PLY {
        return 0;
    }
    let side = board.player;
    generate_all(board, stack, level);
    // filter the freshly generated region in place
    let base = stack.base[level];
    let mut keep = base;
    for i in base..stack.entries.len() {
        let m = stack.entries[i].m;
        let completed = board.make_move(m);
        let legal = !board.is_checked(side);
        board.unmake_move(completed);
        if legal {
            stack.entries[keep] = stack.entries[i];
            keep += 1;
        }
    }
    stack.entries.truncate(keep);
    stack.len(level)
}

/// Determine whether the side to move has any legal move at all.
/// Stops at the first one found.
pub fn has_legal_move(board: &mut Board) -> bool {
    let side = board.player;
    let enemy = !side;
    let enemy_king = board.king_sq(enemy);
    let ours = board.by_color(side);

    for origin in ours {
        let (pt, _) = board[origin].unwrap();
        let destinations = pseudo_destinations(board, origin, pt, side);
        for dest in destinations {
            // king captures never need to be tried
            if dest == enemy_king {
                continue;
            }
            let m = classify(board, origin, dest, pt, side);
            let completed = board.make_move(m);
            let legal = !board.is_checked(side);
            board.unmake_move(completed);
            if legal {
                return true;
            }
        }
    }
    false
}

#[must_use]
/// Determine whether the side to move has been checkmated.
pub fn is_checkmated(board: &mut Board) -> bool {
    board.is_checked(board.player) && !has_legal_move(board)
}

#[must_use]
/// Determine whether the side to move has been stalemated.
pub fn is_stalemated(board: &mut Board) -> bool {
    !board.is_checked(board.player) && !has_legal_move(board)
}

#[must_use]
/// Get the squares the given side's king may castle to right now: the
/// matching right must survive, the king's current, transit and arrival
/// squares must be unattacked, and the squares between king and rook must be
/// empty (including the B-file square on the long side).
pub fn castle_destinations(board: &Board, side: Color) -> Bitboard {
    let mut destinations = Bitboard::EMPTY;
    if board.king_sq(side) != side.king_home() {
        return destinations;
    }
    let enemy = !side;
    let rank = side.home_rank();
    let occupancy = board.occupancy();
    let at = |file| Square::new(rank, file).unwrap();

    if board.castle_rights.kingside(side)
        && !board.is_attacked(at(4), enemy)
        && !board.is_attacked(at(5), enemy)
        && !board.is_attacked(at(6), enemy)
        && !occupancy.contains(at(5))
        && !occupancy.contains(at(6))
    {
        destinations.insert(at(6));
    }
    if board.castle_rights.queenside(side)
        && !board.is_attacked(at(4), enemy)
        && !board.is_attacked(at(3), enemy)
        && !board.is_attacked(at(2), enemy)
        && !occupancy.contains(at(3))
        && !occupancy.contains(at(2))
        && !occupancy.contains(at(1))
    {
        destinations.insert(at(2));
    }
    destinations
}

#[must_use]
/// If the pawn on `origin` may capture en passant, get the square it would
/// arrive on.
pub(crate) fn en_passant_arrival(board: &Board, side: Color, origin: Square) -> Option<Square> {
    let target = board.en_passant_target?;
    // only an enemy pawn standing beside ours can be taken
    if board[target] != Some((Piece::Pawn, !side))
        || target.rank() != origin.rank()
        || origin.file_distance(target) != 1
    {
        return None;
    }
    let arrival_rank = match side {
        Color::White => target.rank() + 1,
        Color::Black => target.rank() - 1,
    };
    Square::new(arrival_rank, target.file())
}

#[must_use]
/// Get the full pseudo-legal destination set of the piece of type `pt` on
/// `origin`, including castling and en passant.
/// Also used by the evaluator as the mobility measure of a piece.
pub fn pseudo_destinations(board: &Board, origin: Square, pt: Piece, side: Color) -> Bitboard {
    let occupancy = board.occupancy();
    let enemies = board.by_color(!side);
    match pt {
        Piece::Pawn => {
            let mut destinations = pawn_pushes(side, origin) & !occupancy;
            if !destinations.is_empty() {
                destinations |= pawn_double_pushes(side, origin) & !occupancy;
            }
            destinations |= pawn_attacks(side, origin) & enemies;
            if let Some(arrival) = en_passant_arrival(board, side, origin) {
                destinations.insert(arrival);
            }
            destinations
        }
        Piece::Knight => knight_moves(origin) & !board.by_color(side),
        Piece::Bishop => board.bishop_attacks(origin) & !board.by_color(side),
        Piece::Rook => board.rook_attacks(origin) & !board.by_color(side),
        Piece::Queen => board.queen_attacks(origin) & !board.by_color(side),
        Piece::King => {
            (king_moves(origin) & !board.by_color(side)) | castle_destinations(board, side)
        }
    }
}

/// Tag a pseudo-legal (origin, destination) pair with its move kind.
fn classify(board: &Board, origin: Square, dest: Square, pt: Piece, side: Color) -> Move {
    if pt == Piece::Pawn && en_passant_arrival(board, side, origin) == Some(dest) {
        Move::en_passant(origin, dest)
    } else if pt == Piece::King && origin == side.king_home() && origin.file_distance(dest) == 2 {
        Move::castling(origin, dest)
    } else {
        Move::new(origin, dest)
    }
}

/// Push a pawn move, fanning out into the four promotions when the pawn
/// reaches the last rank.
fn push_pawn_move(stack: &mut MoveStack, side: Color, mut m: Move) {
    if side.promote_rank().contains(m.destination()) {
        for promote_type in Piece::PROMOTING {
            m.set_promote_type(Some(promote_type));
            stack.push(m);
        }
    } else {
        stack.push(m);
    }
}

/// Generator body for captures.
fn push_captures(board: &Board, stack: &mut MoveStack) {
    let side = board.player;
    let enemies = board.by_color(!side);

    for origin in board.pawns() & board.by_color(side) {
        let mut attacks = pawn_attacks(side, origin) & enemies;
        let arrival = en_passant_arrival(board, side, origin);
        if let Some(sq) = arrival {
            attacks.insert(sq);
        }
        for dest in attacks {
            let m = if arrival == Some(dest) {
                Move::en_passant(origin, dest)
            } else {
                Move::new(origin, dest)
            };
            push_pawn_move(stack, side, m);
        }
    }

    for origin in board.knights() & board.by_color(side) {
        for dest in knight_moves(origin) & enemies {
            stack.push(Move::new(origin, dest));
        }
    }
    for origin in board.bishops() & board.by_color(side) {
        for dest in board.bishop_attacks(origin) & enemies {
            stack.push(Move::new(origin, dest));
        }
    }
    for origin in board.rooks() & board.by_color(side) {
        for dest in board.rook_attacks(origin) & enemies {
            stack.push(Move::new(origin, dest));
        }
    }
    for origin in board.queens() & board.by_color(side) {
        for dest in board.queen_attacks(origin) & enemies {
            stack.push(Move::new(origin, dest));
        }
    }

    let king_origin = board.king_sq(side);
    for dest in king_moves(king_origin) & enemies {
        stack.push(Move::new(king_origin, dest));
    }
}

/// Generator body for quiet moves.
fn push_quiets(board: &Board, stack: &mut MoveStack) {
    let side = board.player;
    let occupancy = board.occupancy();

    for origin in board.pawns() & board.by_color(side) {
        let mut pushes = pawn_pushes(side, origin) & !occupancy;
        if !pushes.is_empty() {
            pushes |= pawn_double_pushes(side, origin) & !occupancy;
        }
        for dest in pushes {
            push_pawn_move(stack, side, Move::new(origin, dest));
        }
    }

    for origin in board.knights() & board.by_color(side) {
        for dest in knight_moves(origin) & !occupancy {
            stack.push(Move::new(origin, dest));
        }
    }
    for origin in board.bishops() & board.by_color(side) {
        for dest in board.bishop_attacks(origin) & !occupancy {
            stack.push(Move::new(origin, dest));
        }
    }
    for origin in board.rooks() & board.by_color(side) {
        for dest in board.rook_attacks(origin) & !occupancy {
            stack.push(Move::new(origin, dest));
        }
    }
    for origin in board.queens() & board.by_color(side) {
        for dest in board.queen_attacks(origin) & !occupancy {
            stack.push(Move::new(origin, dest));
        }
    }

    let king_origin = board.king_sq(side);
    for dest in king_moves(king_origin) & !occupancy {
        stack.push(Move::new(king_origin, dest));
    }
    for dest in castle_destinations(board, side) {
        stack.push(Move::castling(king_origin, dest));
    }
}
