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

//! Pondering: searching while it is the opponent's turn to think.
//!
//! The ponderer spawns one worker thread that takes the game lock, lays out
//! the opponent's candidate replies best-first, and searches each of them
//! ever deeper against the shared transposition table. Whatever it learns
//! is picked up for free by the next foreground search.
//!
//! The worker holds the game lock for its whole run, which is how foreground
//! mutations are kept out: callers stop the ponderer (a synchronous,
//! always-safe operation) before touching the game. Stopping trips the
//! search limit, so the worker unwinds at its next deadline poll and is
//! joined.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::base::{
    movegen::{self, MoveStack},
    Game,
};

use super::{
    evaluate::EvalWeights, limit::SearchLimit, pick, search::Searcher, transposition::TTable,
};

#[derive(Debug)]
/// Controller for the background pondering worker.
pub struct Ponderer {
    /// The running worker, if any.
    worker: Option<JoinHandle<()>>,
    /// The limit the worker runs under; tripped to stop it.
    limit: Arc<SearchLimit>,
}

impl Ponderer {
    #[must_use]
    /// Create a controller with no worker running.
    pub fn new() -> Ponderer {
        Ponderer {
            worker: None,
            limit: Arc::new(SearchLimit::new()),
        }
    }

    #[must_use]
    /// Is a pondering worker currently running?
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start pondering the given game up to `depth` plies per candidate.
    /// A no-op if a worker is already running.
    pub fn start(
        &mut self,
        game: Arc<Mutex<Game>>,
        ttable: Arc<TTable>,
        weights: EvalWeights,
        depth: usize,
    ) {
        if self.worker.is_some() {
            return;
        }
        self.limit.start(None);
        let limit = Arc::clone(&self.limit);
        self.worker = Some(thread::spawn(move || {
            ponder_worker(&game, &ttable, &weights, &limit, depth);
        }));
    }

    /// Stop pondering: trip the limit so the worker aborts at its next poll,
    /// then join it. Safe to call when nothing is running.
    pub fn stop(&mut self) {
        self.limit.stop();
        if let Some(worker) = self.worker.take() {
            // a worker that panicked has already released the game lock
            let _ = worker.join();
        }
    }
}

impl Default for Ponderer {
    fn default() -> Ponderer {
        Ponderer::new()
    }
}

impl Drop for Ponderer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The worker body: order the candidate replies by exchange estimate, then
/// deepen over all of them until told to stop.
fn ponder_worker(
    game: &Mutex<Game>,
    ttable: &TTable,
    weights: &EvalWeights,
    limit: &SearchLimit,
    depth: usize,
) {
    let Ok(mut game) = game.lock() else {
        return;
    };
    let board = game.board_mut();

    let mut stack = MoveStack::new();
    movegen::generate_legal(board, &mut stack, 0);
    for entry in stack.level_mut(0) {
        entry.score = pick::see(board, entry.m);
    }
    let mut candidates = Vec::with_capacity(stack.len(0));
    while let Some(entry) = stack.pop_best(0) {
        candidates.push(entry.m);
    }

    Searcher::new(board, ttable, weights, limit).ponder(&candidates, depth);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn stop_without_start_is_a_noop() {
        let mut ponderer = Ponderer::new();
        ponderer.stop();
        ponderer.stop();
        assert!(!ponderer.is_running());
    }

    #[test]
    fn ponder_lifecycle() {
        let game = Arc::new(Mutex::new(Game::new()));
        let ttable = Arc::new(TTable::new());
        let mut ponderer = Ponderer::new();

        ponderer.start(
            Arc::clone(&game),
            Arc::clone(&ttable),
            EvalWeights::default(),
            3,
        );
        assert!(ponderer.is_running());
        // a second start while running changes nothing
        ponderer.start(
            Arc::clone(&game),
            Arc::clone(&ttable),
            EvalWeights::default(),
            3,
        );

        thread::sleep(Duration::from_millis(50));
        ponderer.stop();
        assert!(!ponderer.is_running());

        // the worker has released the game; the foreground may move
        assert!(!ttable.is_empty());
        let mut game = game.lock().unwrap();
        assert!(game.take_move(
            crate::base::Square::E2,
            crate::base::Square::E4,
            None
        ));
    }

    #[test]
    fn restartable_after_stop() {
        let game = Arc::new(Mutex::new(Game::new()));
        let ttable = Arc::new(TTable::new());
        let mut ponderer = Ponderer::new();
        for _ in 0..3 {
            ponderer.start(
                Arc::clone(&game),
                Arc::clone(&ttable),
                EvalWeights::default(),
                2,
            );
            assert!(ponderer.is_running());
            ponderer.stop();
        }
    }
}
