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

//! Performance testing, i.e. exhaustive move-tree enumeration.
//!
//! Perft counts are the standard way of validating a move generator: the
//! number of leaf positions at each depth is known for a set of tricky
//! positions, and any generation or make/unmake defect shows up as a count
//! mismatch.

use super::{
    movegen::{generate_legal, MoveStack},
    Board,
};

#[must_use]
/// Count the number of leaf positions reachable from `board` in exactly
/// `depth` plies of legal moves.
pub fn perft(board: &mut Board, depth: usize) -> u64 {
    let mut stack = MoveStack::new();
    perft_search(board, &mut stack, 0, depth)
}

/// Recursive helper for [`perft`], reusing one move stack across levels.
fn perft_search(board: &mut Board, stack: &mut MoveStack, level: usize, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let n_moves = generate_legal(board, stack, level) as u64;
    if depth == 1 {
        // the children need not be visited, only counted
        stack.clear(level);
        return n_moves;
    }
    let mut total = 0;
    while let Some(entry) = stack.pop_best(level) {
        let completed = board.make_move(entry.m);
        total += perft_search(board, stack, level + 1, depth - 1);
        board.unmake_move(completed);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Check a position against its known perft counts, depth 1 upward.
    fn perft_helper(fen: &str, expected: &[u64]) {
        let mut board = Board::from_fen(fen).unwrap();
        for (i, &count) in expected.iter().enumerate() {
            assert_eq!(perft(&mut board, i + 1), count, "depth {}", i + 1);
            // the board must come back untouched
            assert_eq!(board, Board::from_fen(fen).unwrap());
        }
    }

    #[test]
    fn start_position() {
        perft_helper(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            &[20, 400, 8_902, 197_281],
        );
    }

    #[test]
    /// "Kiwipete", a position dense with castles, pins, and en passant.
    fn kiwipete() {
        perft_helper(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            &[48, 2_039, 97_862],
        );
    }

    #[test]
    /// An endgame heavy with promotions and underpromotions.
    fn promotion_endgame() {
        perft_helper(
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            &[44, 1_486, 62_379],
        );
    }

    #[test]
    /// A position once famous for catching en-passant-pin bugs.
    fn en_passant_discovered_check() {
        perft_helper("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", &[14, 191, 2_812]);
    }
}
