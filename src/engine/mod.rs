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

//! The engine proper: evaluation, search, the transposition table, time
//! management, pondering, and the facade tying them to a game.

pub mod evaluate;
pub use evaluate::{evaluate, EvalWeights, SCORE_DRAW, SCORE_LOSE, SCORE_WIN};

pub mod limit;
pub use limit::SearchLimit;

mod pick;
pub use pick::see;

mod ponder;
pub use ponder::Ponderer;

pub mod search;
pub use search::{pick_move, Searcher, INFINITE};

pub mod transposition;
pub use transposition::{Bound, TTEntry, TTable};

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::base::{game::GameRecord, Board, Color, Game, Move};

#[derive(Debug)]
/// A complete engine: a game of chess behind a lock, a shared transposition
/// table, evaluation weights, and a pondering worker.
///
/// This is the surface a front end drives: wire-form moves go in, a best
/// move under a time budget comes out.
pub struct Engine {
    /// The game, shared with the pondering worker.
    game: Arc<Mutex<Game>>,
    /// The transposition table, shared between foreground searches and the
    /// ponderer.
    ttable: Arc<TTable>,
    /// The evaluation weights in effect.
    weights: EvalWeights,
    /// The pondering controller.
    ponderer: Ponderer,
}

impl Engine {
    #[must_use]
    /// Create an engine holding a game in the standard starting position.
    pub fn new() -> Engine {
        Engine::with_game(Game::new())
    }

    /// Create an engine holding a game starting from a FEN position.
    ///
    /// # Errors
    ///
    /// Will return an `Err` describing the problem if the FEN is invalid.
    pub fn from_fen(fen: &str) -> Result<Engine, &'static str> {
        Ok(Engine::with_game(Game::from_fen(fen)?))
    }

    #[must_use]
    /// Create an engine holding a game restored from a record.
    pub fn from_record(record: &GameRecord) -> Engine {
        Engine::with_game(Game::from_record(record))
    }

    /// Wrap a game into a full engine.
    fn with_game(game: Game) -> Engine {
        Engine {
            game: Arc::new(Mutex::new(game)),
            ttable: Arc::new(TTable::new()),
            weights: EvalWeights::default(),
            ponderer: Ponderer::new(),
        }
    }

    /// Replace the evaluation weights.
    pub fn set_weights(&mut self, weights: EvalWeights) {
        self.weights = weights;
    }

    #[must_use]
    /// Get the transposition table this engine searches against.
    pub fn table(&self) -> Arc<TTable> {
        Arc::clone(&self.ttable)
    }

    /// Lock and access the underlying game.
    /// Blocks while a pondering worker is running; stop it first.
    ///
    /// # Panics
    ///
    /// Panics if the game lock was poisoned.
    pub fn game(&self) -> MutexGuard<'_, Game> {
        self.game.lock().unwrap()
    }

    #[must_use]
    /// Get a copy of the current board.
    pub fn board(&self) -> Board {
        *self.game().board()
    }

    #[must_use]
    /// Get a snapshot record of the current position.
    pub fn record(&self) -> GameRecord {
        self.game().record().clone()
    }

    /// Try to play a wire-form move (`e2e4`, or `e7e8Q` for a promotion; a
    /// promotion without a letter becomes a queen). Returns whether the move
    /// was legal and applied; an illegal or unparseable move changes
    /// nothing.
    pub fn take_move(&self, wire: &str) -> bool {
        let Ok((origin, destination, promotion)) = Move::parse_wire(wire) else {
            return false;
        };
        self.game().take_move(origin, destination, promotion)
    }

    /// Step the game cursor one position back. No effect at the start.
    pub fn step_back(&self) {
        self.game().step_back();
    }

    /// Step the game cursor one position forward. No effect at the end.
    pub fn step_forward(&self) {
        self.game().step_forward();
    }

    #[must_use]
    /// Get every legal move in the current position.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.game().legal_moves()
    }

    #[must_use]
    /// Search for the best move under a wall-clock budget in seconds.
    /// The budget is clamped to at least one second.
    ///
    /// With no legal moves available the sentinel [`Move::NONE`] (origin
    /// equal to destination) comes back; [`Engine::is_checkmated`] and
    /// [`Engine::is_stalemated`] tell the two reasons apart.
    pub fn best_move(&self, seconds: f64) -> Move {
        let seconds = if seconds < 1.0 { 1.0 } else { seconds };
        let limit = SearchLimit::new();
        limit.start(Some(Duration::from_secs_f64(seconds)));
        let mut game = self.game();
        pick_move(game.board_mut(), &self.ttable, &self.weights, &limit)
    }

    /// Begin pondering the current position up to `depth` plies per
    /// candidate reply, against the shared table. A no-op when already
    /// pondering.
    pub fn start_pondering(&mut self, depth: usize) {
        self.ponderer.start(
            Arc::clone(&self.game),
            Arc::clone(&self.ttable),
            self.weights,
            depth,
        );
    }

    /// Stop pondering and wait for the worker to wind down. Safe to call
    /// when not pondering.
    pub fn stop_pondering(&mut self) {
        self.ponderer.stop();
    }

    #[must_use]
    /// Determine whether the player to move has been checkmated.
    pub fn is_checkmated(&self) -> bool {
        self.game().is_checkmated()
    }

    #[must_use]
    /// Determine whether the player to move has been stalemated.
    pub fn is_stalemated(&self) -> bool {
        self.game().is_stalemated()
    }

    #[must_use]
    /// Determine whether the given side's king is in check.
    pub fn is_checked(&self, side: Color) -> bool {
        self.game().is_checked(side)
    }

    #[must_use]
    /// Determine whether the given side has castled in this game.
    pub fn has_castled(&self, side: Color) -> bool {
        self.game().has_castled(side)
    }

    #[must_use]
    /// Statically evaluate the current position from `side`'s point of
    /// view, using this engine's weights.
    pub fn evaluate(&self, side: Color) -> i32 {
        let mut game = self.game();
        evaluate(game.board_mut(), side, &self.weights)
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Piece, Square};

    /// Feed a sequence of wire moves to an engine, asserting each is legal.
    fn play(engine: &Engine, moves: &[&str]) {
        for m in moves {
            assert!(engine.take_move(m), "move {m} was rejected");
        }
    }

    #[test]
    /// Spanish opening: the pinning bishop constrains Black's choices.
    fn spanish_legal_moves() {
        let engine = Engine::new();
        play(&engine, &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);

        let moves = engine.legal_moves();
        assert!(moves.contains(&Move::new(Square::A7, Square::A6)));
        // the king's only flight square is e7; every generated king move is
        // onto a square the bishop does not see
        let king_moves: Vec<&Move> = moves
            .iter()
            .filter(|m| m.origin() == Square::E8)
            .collect();
        assert_eq!(king_moves.len(), 1);
        assert_eq!(king_moves[0].destination(), Square::E7);
    }

    #[test]
    /// Scholar's mate: the engine recognizes the finished game.
    fn scholars_mate() {
        let engine = Engine::new();
        play(
            &engine,
            &["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6", "h5f7"],
        );
        assert!(engine.is_checkmated());
        assert!(!engine.is_stalemated());
        assert!(engine.is_checked(Color::Black));
        assert!(engine.legal_moves().is_empty());
        let m = engine.best_move(1.0);
        assert!(m.is_sentinel());
    }

    #[test]
    /// En passant over the wire, and its reversal.
    fn en_passant_round_trip() {
        let engine = Engine::new();
        play(&engine, &["e2e4", "c7c5", "e4e5", "d7d5"]);
        let before = engine.board();
        play(&engine, &["e5d6"]);

        let after = engine.board();
        assert_eq!(after[Square::D6], Some((Piece::Pawn, Color::White)));
        assert_eq!(after[Square::D5], None);
        assert_eq!(after[Square::E5], None);

        engine.step_back();
        assert_eq!(engine.board(), before);
        assert_eq!(
            engine.board()[Square::D5],
            Some((Piece::Pawn, Color::Black))
        );
    }

    #[test]
    /// Castling through the facade: rook and king end up swapped around,
    /// and the rights are spent.
    fn castling_short() {
        let engine = Engine::new();
        play(
            &engine,
            &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1"],
        );
        let board = engine.board();
        assert_eq!(board[Square::G1], Some((Piece::King, Color::White)));
        assert_eq!(board[Square::F1], Some((Piece::Rook, Color::White)));
        assert!(engine.has_castled(Color::White));
        assert!(!board.castle_rights.any(Color::White));
    }

    #[test]
    /// Two bare kings evaluate as dead drawn.
    fn bare_kings_evaluate_drawn() {
        let engine = Engine::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(engine.evaluate(Color::White), SCORE_DRAW);
        assert_eq!(engine.evaluate(Color::Black), SCORE_DRAW);
    }

    #[test]
    fn garbage_moves_are_rejected() {
        let engine = Engine::new();
        assert!(!engine.take_move("zz9x"));
        assert!(!engine.take_move("e2"));
        assert!(!engine.take_move("e2e5"));
        assert_eq!(engine.board(), Board::new());
    }

    #[test]
    fn best_move_is_legal() {
        let engine = Engine::new();
        let m = engine.best_move(1.0);
        assert!(engine.legal_moves().contains(&m));
        // and the engine can play its own suggestion
        assert!(engine.take_move(&m.to_wire()));
    }

    #[test]
    /// The search finds mate in one through the facade.
    fn finds_mate_in_one() {
        let engine = Engine::from_fen("3k4/R7/1R6/5K2/8/8/8/8 w - - 0 1").unwrap();
        let m = engine.best_move(1.0);
        assert_eq!(m, Move::new(Square::B6, Square::B8));
        assert!(engine.take_move(&m.to_wire()));
        assert!(engine.is_checkmated());
    }

    #[test]
    /// Pondering shares its table with the foreground search and stays out
    /// of the foreground's way once stopped.
    fn pondering_cooperates() {
        let mut engine = Engine::new();
        engine.start_pondering(3);
        std::thread::sleep(std::time::Duration::from_millis(50));
        engine.stop_pondering();
        assert!(!engine.table().is_empty());

        play(&engine, &["e2e4"]);
        let m = engine.best_move(1.0);
        assert!(engine.legal_moves().contains(&m));

        // stopping again is harmless
        engine.stop_pondering();
    }
}
