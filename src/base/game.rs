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

//! Full games: a board plus the history needed to step through a game and
//! count repetitions.

use nohash_hasher::IntMap;

use super::{
    movegen::{self, MoveStack},
    Bitboard, Board, CastleRights, Color, Move, Piece, Square,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// A frozen snapshot of one position in a game, rich enough to restore a
/// playable [`Board`] from.
pub struct GameRecord {
    /// The piece placements, indexed by color then piece type.
    placements: [[Bitboard; Piece::NUM]; 2],
    /// The color of the player to move.
    pub player: Color,
    /// The castling rights still standing.
    pub castle_rights: CastleRights,
    /// The square of a pawn capturable en passant, if any.
    pub en_passant_target: Option<Square>,
    /// Whether each side has castled, White first.
    pub castled: [bool; 2],
    /// The number of half-moves played to reach this position.
    pub ply: u32,
    /// Half-moves since the last capture or pawn move, for the 50-move rule.
    pub rule50: u32,
    /// How many times this piece placement has occurred in the game,
    /// this occurrence included.
    pub repetition: u32,
    /// The completed move that produced this position.
    /// [`Move::NONE`] for the first record of a game.
    pub last_move: Move,
    /// The position hash.
    pub hash: u64,
}

impl GameRecord {
    #[must_use]
    /// Freeze the given board into a record.
    pub fn freeze(
        board: &Board,
        ply: u32,
        rule50: u32,
        repetition: u32,
        last_move: Move,
    ) -> GameRecord {
        let mut placements = [[Bitboard::EMPTY; Piece::NUM]; 2];
        for color in Color::ALL {
            for pt in Piece::ALL {
                placements[color as usize][pt as usize] =
                    board.by_piece(pt) & board.by_color(color);
            }
        }
        GameRecord {
            placements,
            player: board.player,
            castle_rights: board.castle_rights,
            en_passant_target: board.en_passant_target,
            castled: [
                board.has_castled(Color::White),
                board.has_castled(Color::Black),
            ],
            ply,
            rule50,
            repetition,
            last_move,
            hash: board.hash,
        }
    }

    #[must_use]
    /// Get the squares occupied by one color's pieces of one type.
    pub fn placement(&self, color: Color, pt: Piece) -> Bitboard {
        self.placements[color as usize][pt as usize]
    }
}

#[derive(Clone, Debug)]
/// A chess game: the current board, the full history of positions reached,
/// and a cursor into that history.
///
/// The cursor allows stepping backward and forward through the game; playing
/// a move while the cursor is in the past discards the abandoned future.
pub struct Game {
    /// The live board, always equal to the position under the cursor.
    board: Board,
    /// Every position reached, oldest first.
    history: Vec<GameRecord>,
    /// Index into `history` of the current position.
    cursor: usize,
    /// Occurrence counts of each placement hash in `history[..=cursor]`,
    /// maintained so repetition counting is one map probe.
    counts: IntMap<u64, u32>,
}

impl Game {
    #[must_use]
    /// Construct a new game in the conventional starting position.
    pub fn new() -> Game {
        Game::with_board(Board::new())
    }

    /// Construct a game starting from a FEN position.
    ///
    /// # Errors
    ///
    /// Will return an `Err` describing the problem if the FEN is invalid.
    pub fn from_fen(fen: &str) -> Result<Game, &'static str> {
        Ok(Game::with_board(Board::from_fen(fen)?))
    }

    #[must_use]
    /// Construct a game whose first position is restored from a record.
    pub fn from_record(record: &GameRecord) -> Game {
        let board = Board::from_record(record);
        let mut counts = IntMap::default();
        counts.insert(board.hash, 1);
        Game {
            board,
            history: vec![record.clone()],
            cursor: 0,
            counts,
        }
    }

    /// Construct a game starting from an arbitrary board.
    fn with_board(board: Board) -> Game {
        let mut counts = IntMap::default();
        counts.insert(board.hash, 1);
        Game {
            history: vec![GameRecord::freeze(&board, 0, 0, 1, Move::NONE)],
            board,
            cursor: 0,
            counts,
        }
    }

    #[must_use]
    /// Get the current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Get mutable access to the current board, for the search to make and
    /// unmake moves on. The search leaves the board exactly as it found it.
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[must_use]
    /// Get the record of the current position.
    pub fn record(&self) -> &GameRecord {
        &self.history[self.cursor]
    }

    #[must_use]
    /// Get every recorded position of this game, oldest first.
    /// Positions past the cursor are lines that were stepped back out of.
    pub fn history(&self) -> &[GameRecord] {
        &self.history
    }

    #[must_use]
    /// Get the index of the current position within the history.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Try to play the move described by an origin, a destination, and an
    /// optional promotion type. Returns whether the move was legal and
    /// applied.
    ///
    /// A pawn reaching the last rank with no promotion type given promotes
    /// to a queen. Playing a move while the cursor is in the past discards
    /// the history beyond the cursor.
    pub fn take_move(
        &mut self,
        origin: Square,
        destination: Square,
        promotion: Option<Piece>,
    ) -> bool {
        let mut stack = MoveStack::new();
        movegen::generate_legal(&mut self.board, &mut stack, 0);

        let mut found = None;
        while let Some(entry) = stack.pop_best(0) {
            let m = entry.m;
            if m.origin() != origin || m.destination() != destination {
                continue;
            }
            match m.promote_type() {
                // non-promotions match on the squares alone
                None => {
                    found = Some(m);
                    break;
                }
                Some(pt) if pt == promotion.unwrap_or(Piece::Queen) => {
                    found = Some(m);
                    break;
                }
                Some(_) => (),
            }
        }
        let Some(m) = found else {
            return false;
        };

        let is_pawn_move = self.board[origin].map(|(pt, _)| pt) == Some(Piece::Pawn);
        let completed = self.board.make_move(m);

        // discard any future that was stepped back out of
        for stale in self.history.drain(self.cursor + 1..) {
            decrement(&mut self.counts, stale.hash);
        }

        let prior = &self.history[self.cursor];
        let ply = prior.ply + 1;
        let rule50 = if is_pawn_move || completed.captured().is_some() {
            0
        } else {
            prior.rule50 + 1
        };
        let repetition = self.counts.get(&self.board.hash).copied().unwrap_or(0) + 1;

        self.history
            .push(GameRecord::freeze(&self.board, ply, rule50, repetition, completed));
        *self.counts.entry(self.board.hash).or_insert(0) += 1;
        self.cursor += 1;
        true
    }

    /// Move the cursor one position back, unmaking the move that produced
    /// the current position. No effect at the start of the game.
    pub fn step_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let record = &self.history[self.cursor];
        let hash = record.hash;
        self.board.unmake_move(record.last_move);
        decrement(&mut self.counts, hash);
        self.cursor -= 1;
        debug_assert_eq!(self.board.hash, self.history[self.cursor].hash);
    }

    /// Move the cursor one position forward, remaking the move that was
    /// stepped back out of. No effect at the end of the history.
    pub fn step_forward(&mut self) {
        if self.cursor + 1 >= self.history.len() {
            return;
        }
        let m = self.history[self.cursor + 1].last_move;
        self.board.make_move(m);
        self.cursor += 1;
        *self.counts.entry(self.board.hash).or_insert(0) += 1;
        debug_assert_eq!(self.board.hash, self.history[self.cursor].hash);
    }

    #[must_use]
    /// Get every legal move in the current position.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        let mut stack = MoveStack::new();
        movegen::generate_legal(&mut self.board, &mut stack, 0);
        let mut moves = Vec::with_capacity(stack.len(0));
        while let Some(entry) = stack.pop_best(0) {
            moves.push(entry.m);
        }
        moves
    }

    #[must_use]
    /// Determine whether the player to move has been checkmated.
    pub fn is_checkmated(&mut self) -> bool {
        movegen::is_checkmated(&mut self.board)
    }

    #[must_use]
    /// Determine whether the player to move has been stalemated.
    pub fn is_stalemated(&mut self) -> bool {
        movegen::is_stalemated(&mut self.board)
    }

    #[must_use]
    /// Determine whether the given side's king is in check.
    pub fn is_checked(&self, side: Color) -> bool {
        self.board.is_checked(side)
    }

    #[must_use]
    /// Determine whether the given side has castled in this game.
    pub fn has_castled(&self, side: Color) -> bool {
        self.board.has_castled(side)
    }
}

impl Default for Game {
    fn default() -> Game {
        Game::new()
    }
}

/// Decrement an occurrence count, dropping the key at zero.
fn decrement(counts: &mut IntMap<u64, u32>, hash: u64) {
    if let Some(n) = counts.get_mut(&hash) {
        *n -= 1;
        if *n == 0 {
            counts.remove(&hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Play a sequence of wire-form moves, asserting each is legal.
    fn play(game: &mut Game, moves: &[&str]) {
        for s in moves {
            let (origin, destination, promotion) = Move::parse_wire(s).unwrap();
            assert!(
                game.take_move(origin, destination, promotion),
                "move {s} was rejected"
            );
        }
    }

    #[test]
    fn illegal_moves_rejected() {
        let mut game = Game::new();
        // a pawn cannot jump three ranks
        assert!(!game.take_move(Square::E2, Square::E5, None));
        // an empty square cannot move
        assert!(!game.take_move(Square::E4, Square::E5, None));
        // the state is untouched
        assert_eq!(game.cursor(), 0);
        assert_eq!(game.board(), &Board::new());
    }

    #[test]
    fn repetition_counting() {
        let mut game = Game::new();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        play(&mut game, &shuffle);
        // back to the initial placement for the second time
        assert_eq!(game.record().repetition, 2);
        play(&mut game, &shuffle);
        // the third visit
        assert_eq!(game.record().repetition, 3);
    }

    #[test]
    fn step_back_and_forward() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5", "g1f3"]);
        let latest = game.board().clone();

        game.step_back();
        game.step_back();
        assert_eq!(game.cursor(), 1);
        assert_eq!(game.board().hash, game.history()[1].hash);

        game.step_forward();
        game.step_forward();
        assert_eq!(game.board(), &latest);

        // stepping past the ends is a no-op
        game.step_forward();
        assert_eq!(game.cursor(), 3);
        for _ in 0..5 {
            game.step_back();
        }
        assert_eq!(game.cursor(), 0);
        assert_eq!(game.board(), &Board::new());
    }

    #[test]
    fn branching_discards_future() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5"]);
        game.step_back();
        // take a different second move for Black
        play(&mut game, &["c7c5"]);
        assert_eq!(game.history().len(), 3);
        assert_eq!(game.cursor(), 2);
        assert_eq!(
            game.board()[Square::C5],
            Some((Piece::Pawn, Color::Black))
        );
        assert_eq!(game.board()[Square::E5], None);
    }

    #[test]
    fn rule50_counting() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5"]); // pawn moves reset
        assert_eq!(game.record().rule50, 0);
        play(&mut game, &["g1f3", "b8c6"]);
        assert_eq!(game.record().rule50, 2);
        play(&mut game, &["f3e5"]); // a capture resets again
        assert_eq!(game.record().rule50, 0);
    }

    /// March the h-pawn up to h7 with the g8 knight waiting to be taken.
    const PROMOTION_RUN: [&str; 8] = [
        "h2h4", "g7g5", "h4g5", "g8f6", "g5g6", "f6g8", "g6h7", "e7e6",
    ];

    #[test]
    fn default_promotion_is_queen() {
        let mut game = Game::new();
        play(&mut game, &PROMOTION_RUN);
        play(&mut game, &["h7g8"]);
        assert_eq!(
            game.board()[Square::G8],
            Some((Piece::Queen, Color::White))
        );
    }

    #[test]
    fn chosen_underpromotion() {
        let mut game = Game::new();
        play(&mut game, &PROMOTION_RUN);
        play(&mut game, &["h7g8N"]);
        assert_eq!(
            game.board()[Square::G8],
            Some((Piece::Knight, Color::White))
        );
    }

    #[test]
    fn restore_from_record() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "c7c5", "g1f3"]);
        let restored = Game::from_record(game.record());
        assert_eq!(restored.board(), game.board());
        assert_eq!(restored.record().ply, 3);
        assert_eq!(restored.history().len(), 1);
    }
}
