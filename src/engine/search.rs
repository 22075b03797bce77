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

//! The search: iterative deepening around a principal-variation search with
//! quiescence extension.
//!
//! The main search is alpha-beta with a zero-window probe for every move
//! after the first improvement (re-searched full-width when the probe lands
//! inside the window), null-move pruning at safe interior nodes, and
//! futility pruning at the frontier. At depth zero the quiescence search
//! takes over, following captures (or check evasions) until the position
//! goes quiet. Both layers consult and feed the shared transposition table.
//!
//! The wall clock is polled after every move popped and between deepening
//! iterations; an expired search abandons the node with its running bound,
//! and the driver answers with the best move of the deepest completed work.

use crate::base::{
    movegen::{self, MoveStack, MAX_PLY},
    Board, Move, MoveKind, Piece,
};

use super::{
    evaluate::{evaluate, EvalWeights, SCORE_WIN},
    limit::SearchLimit,
    pick,
    transposition::{Bound, TTable},
};

/// A value beyond any achievable evaluation, the starting window bound.
pub const INFINITE: i32 = 9_999_999;

/// The depth reduction applied to the null-move probe.
const NULL_MOVE_REDUCTION: i32 = 3;

#[derive(Debug)]
/// The state of one search: the board being searched, the move arena, and
/// the shared resources consulted along the way.
pub struct Searcher<'a> {
    /// The board to search. Mutated during the search, restored by the time
    /// any public call returns.
    board: &'a mut Board,
    /// The shared transposition table.
    ttable: &'a TTable,
    /// The evaluation weights in effect.
    weights: &'a EvalWeights,
    /// The limit under which this search runs.
    limit: &'a SearchLimit,
    /// The per-level move arena.
    stack: MoveStack,
    /// The best move found at the root so far.
    best_move: Move,
    /// The score of `best_move`.
    best_score: i32,
}

/// Select a move for the side to move on `board`, searching until `limit`
/// expires. Deepens one ply at a time, keeping the answer of the deepest
/// completed iteration.
///
/// If the position has no legal moves, the returned move is the sentinel
/// [`Move::NONE`] (origin equal to destination); callers distinguish mate
/// from stalemate through the board queries.
pub fn pick_move(
    board: &mut Board,
    ttable: &TTable,
    weights: &EvalWeights,
    limit: &SearchLimit,
) -> Move {
    let hash = board.hash;
    let mut searcher = Searcher::new(board, ttable, weights, limit);
    for depth in 1..MAX_PLY {
        #[allow(clippy::cast_possible_wrap)]
        searcher.search(0, depth as i32, -INFINITE, INFINITE, false, hash);
        if limit.is_over() {
            break;
        }
    }
    searcher.best_move
}

/// The guards on null-move pruning. The probe is only sound away from the
/// root, outside a null-move subtree, with a choice of moves, with depth to
/// spare, out of check, and with enough material that passing the turn is
/// unlikely to be best (zugzwang).
pub(crate) fn may_null_prune(
    level: usize,
    is_null_search: bool,
    move_count: usize,
    depth: i32,
    is_check: bool,
    material: i32,
) -> bool {
    level != 0
        && !is_null_search
        && move_count > 1
        && depth > NULL_MOVE_REDUCTION
        && !is_check
        && material >= Piece::Rook.value()
}

impl<'a> Searcher<'a> {
    /// Construct a searcher over `board` using the given shared resources.
    pub fn new(
        board: &'a mut Board,
        ttable: &'a TTable,
        weights: &'a EvalWeights,
        limit: &'a SearchLimit,
    ) -> Searcher<'a> {
        Searcher {
            board,
            ttable,
            weights,
            limit,
            stack: MoveStack::new(),
            best_move: Move::NONE,
            best_score: -INFINITE,
        }
    }

    #[must_use]
    /// Get the best move found so far at the root.
    pub fn best_move(&self) -> Move {
        self.best_move
    }

    #[must_use]
    /// Get the score of the best move found so far at the root.
    pub fn best_score(&self) -> i32 {
        self.best_score
    }

    /// Search during the opponent's thinking time: for each candidate reply
    /// (ordered best first), search it at every depth up to `max_depth`
    /// with an open window, populating the shared table. Returns early when
    /// the limit is raised.
    pub fn ponder(&mut self, candidates: &[Move], max_depth: usize) {
        for depth in 1..=max_depth {
            for &m in candidates {
                if self.limit.is_over() {
                    return;
                }
                let completed = self.board.make_move(m);
                let hash = self.board.hash;
                #[allow(clippy::cast_possible_wrap)]
                self.search(0, depth as i32, -INFINITE, INFINITE, false, hash);
                self.board.unmake_move(completed);
            }
        }
    }

    /// The value a capture is worth before simulation, for futility
    /// pruning: the piece standing on the destination (a pawn for en
    /// passant).
    fn captured_value(&self, m: Move) -> i32 {
        if m.kind() == MoveKind::EnPassant {
            return Piece::Pawn.value();
        }
        self.board[m.destination()].map_or(0, |(pt, _)| pt.value())
    }

    /// Record `m` as the best move at the root.
    fn save_root(&mut self, m: Move, score: i32) {
        self.best_move = m;
        self.best_score = score;
    }

    /// The principal-variation search.
    ///
    /// `level` is the distance from the root, `depth` the remaining depth to
    /// search, `(alpha, beta)` the current window from the point of view of
    /// the side to move, `is_null_search` whether this node lies inside a
    /// null-move probe, and `hash` the hash of the position on the board.
    #[allow(clippy::cast_possible_truncation)]
    pub fn search(
        &mut self,
        level: usize,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        is_null_search: bool,
        hash: u64,
    ) -> i32 {
        let side = self.board.player;

        // consult the table first: an entry from an equal or deeper search
        // may answer outright, or at least shrink the window
        if let Some(entry) = self.ttable.probe(hash, level as u8, depth as i8, side) {
            match entry.bound {
                Bound::Exact => {
                    if level == 0 {
                        self.save_root(entry.best_move, entry.value);
                    }
                    return entry.value;
                }
                Bound::Lower => {
                    if entry.value >= beta {
                        if level == 0 {
                            self.save_root(entry.best_move, entry.value);
                        }
                        return entry.value;
                    }
                    alpha = alpha.max(entry.value);
                }
                Bound::Upper => {
                    if entry.value <= alpha {
                        if level == 0 {
                            self.save_root(entry.best_move, entry.value);
                        }
                        return entry.value;
                    }
                    beta = beta.min(entry.value);
                }
            }
        }

        if depth <= 0 {
            return self.quiesce(level, depth, alpha, beta, hash);
        }

        if !movegen::has_legal_move(self.board) {
            return evaluate(self.board, side, self.weights);
        }
        let is_check = self.board.is_checked(side);

        let move_count = movegen::generate_all(self.board, &mut self.stack, level);
        if move_count == 0 {
            return evaluate(self.board, side, self.weights);
        }
        pick::score_moves(self.board, &mut self.stack, level, hash, depth, self.ttable);

        let material = self.board.material(side);

        if may_null_prune(level, is_null_search, move_count, depth, is_check, material) {
            let completed = self.board.make_move(Move::null());
            // only placements are hashed, so the hash carries over
            let null_score =
                -self.search(level + 1, depth - NULL_MOVE_REDUCTION, -beta, 1 - beta, true, hash);
            self.board.unmake_move(completed);
            if null_score >= beta {
                self.stack.clear(level);
                return null_score;
            }
        }

        let save_alpha = alpha;
        let mut candidate = Move::NONE;
        let mut full_search = true;
        while let Some(entry) = self.stack.pop_best(level) {
            if self.limit.is_over() {
                self.stack.clear(level);
                return alpha;
            }
            let m = entry.m;
            let capture_value = self.captured_value(m);

            let completed = self.board.make_move(m);
            let next_hash = self.board.hash;

            // a root move that mates on the spot need not be searched
            if level == 0 && movegen::is_checkmated(self.board) {
                self.board.unmake_move(completed);
                self.save_root(m, SCORE_WIN);
                self.ttable
                    .store(hash, 0, depth as i8, side, SCORE_WIN, Bound::Exact, m);
                self.stack.clear(level);
                return SCORE_WIN;
            }

            // pseudo-legal generation: throw out anything leaving our king
            // in check
            if self.board.is_checked(side) {
                self.board.unmake_move(completed);
                continue;
            }

            // futility: at the frontier, a quiet-ish move with no hope of
            // raising alpha even with a bishop of positional slack is
            // skipped
            if level != 0
                && !is_check
                && depth == 1
                && material + capture_value + Piece::Bishop.value() <= alpha
            {
                self.board.unmake_move(completed);
                continue;
            }

            let score = if full_search {
                -self.search(level + 1, depth - 1, -beta, -alpha, is_null_search, next_hash)
            } else {
                // zero-window probe, then a full re-search if it lands
                // inside the window
                let mut probe = -self.search(
                    level + 1,
                    depth - 1,
                    -alpha - 1,
                    -alpha,
                    is_null_search,
                    next_hash,
                );
                if probe > alpha && probe < beta {
                    probe = -self.search(
                        level + 1,
                        depth - 1,
                        -beta,
                        -alpha,
                        is_null_search,
                        next_hash,
                    );
                }
                probe
            };
            self.board.unmake_move(completed);

            if score > alpha {
                if score >= beta {
                    self.stack.clear(level);
                    self.ttable
                        .store(hash, level as u8, depth as i8, side, score, Bound::Lower, m);
                    return score;
                }
                if level == 0 {
                    self.save_root(m, score);
                }
                candidate = m;
                alpha = score;
                full_search = false;
            }
        }

        let bound = if alpha <= save_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.ttable
            .store(hash, level as u8, depth as i8, side, alpha, bound, candidate);
        alpha
    }

    /// The quiescence search: evaluate the position, then keep searching
    /// captures (or evasions while in check) until the position goes quiet,
    /// using the stand-pat score as a floor.
    #[allow(clippy::cast_possible_truncation)]
    fn quiesce(&mut self, level: usize, depth: i32, mut alpha: i32, mut beta: i32, hash: u64) -> i32 {
        let side = self.board.player;

        if let Some(entry) = self.ttable.probe(hash, level as u8, depth as i8, side) {
            match entry.bound {
                Bound::Exact => return entry.value,
                Bound::Lower => {
                    if entry.value >= beta {
                        return entry.value;
                    }
                    alpha = alpha.max(entry.value);
                }
                Bound::Upper => {
                    if entry.value <= alpha {
                        return entry.value;
                    }
                    beta = beta.min(entry.value);
                }
            }
        }

        // capturing is never forced, so the present evaluation is a floor
        let stand_pat = evaluate(self.board, side, self.weights);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        if !self.board.has_sufficient_material(side)
            && !self.board.has_sufficient_material(!side)
        {
            return stand_pat;
        }
        if !movegen::has_legal_move(self.board) {
            return stand_pat;
        }

        let is_check = self.board.is_checked(side);
        let move_count = if is_check {
            movegen::generate_legal(self.board, &mut self.stack, level)
        } else {
            movegen::generate_captures(self.board, &mut self.stack, level)
        };
        if move_count == 0 {
            return stand_pat;
        }
        pick::score_moves(self.board, &mut self.stack, level, hash, depth, self.ttable);

        let material = self.board.material(side);
        let save_alpha = alpha;
        let mut candidate = Move::NONE;
        while let Some(entry) = self.stack.pop_best(level) {
            if self.limit.is_over() {
                self.stack.clear(level);
                return alpha;
            }
            let m = entry.m;
            let capture_value = self.captured_value(m);

            let completed = self.board.make_move(m);
            let next_hash = self.board.hash;
            if self.board.is_checked(side) {
                self.board.unmake_move(completed);
                continue;
            }
            if level != 0
                && !is_check
                && material + capture_value + Piece::Bishop.value() <= alpha
            {
                self.board.unmake_move(completed);
                continue;
            }
            let score = -self.quiesce(level + 1, depth - 1, -beta, -alpha, next_hash);
            self.board.unmake_move(completed);

            if score > alpha {
                if score >= beta {
                    self.ttable
                        .store(hash, level as u8, depth as i8, side, score, Bound::Lower, m);
                    self.stack.clear(level);
                    return beta;
                }
                candidate = m;
                alpha = score;
            }
        }

        let bound = if alpha <= save_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.ttable
            .store(hash, level as u8, depth as i8, side, alpha, bound, candidate);
        alpha
    }
}
