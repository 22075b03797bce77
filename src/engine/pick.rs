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

//! Move ordering.
//!
//! Alpha-beta search lives and dies by move ordering: the earlier the best
//! move is tried, the more of the tree gets cut off. Two signals order the
//! moves here. The move remembered by the transposition table from the
//! previous, one-shallower search of the same position goes first,
//! unconditionally. Every other move is ranked by its static exchange
//! estimate: the material that changes hands if the capture (or move) is
//! answered by an alternating sequence of least-valuable-attacker captures
//! on the destination square.

use crate::base::{
    movegen::{MoveStack, MAX_PLY},
    Bitboard, Board, Move, Piece,
};

use super::{search::INFINITE, transposition::TTable};

/// The piece types from least to most valuable, the order in which the
/// exchange estimator commits attackers.
const LEAST_VALUABLE: [Piece; Piece::NUM] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

#[must_use]
/// Statically estimate the material outcome of playing `m`, by simulating an
/// exchange on its destination square: each side in turn recaptures with its
/// least valuable remaining attacker (X-ray attackers included) until one
/// side runs out, or until the only capture would expose a king.
///
/// A capture of a piece worth more than the mover is taken at face value
/// without simulation. Quiet moves start from zero captured material, so
/// their estimate is never positive.
pub fn see(board: &Board, m: Move) -> i32 {
    let mover = board[m.origin()].unwrap().0;
    let target_value = board[m.destination()].map_or(0, |(pt, _)| pt.value());

    // an immediately winning exchange needs no simulation
    let immediate = target_value - mover.value();
    if immediate > 0 {
        return immediate;
    }

    let side = board.player;
    let enemy = !side;
    let dest = m.destination();

    // attacker pools per side and piece type; the mover is already committed
    let own_attackers = board.attackers_to(dest, side) & !Bitboard::from(m.origin());
    let enemy_attackers = board.attackers_to(dest, enemy);
    let mut remaining = [[Bitboard::EMPTY; Piece::NUM]; 2];
    for pt in Piece::ALL {
        remaining[side as usize][pt as usize] =
            board.by_piece(pt) & board.by_color(side) & own_attackers;
        remaining[enemy as usize][pt as usize] =
            board.by_piece(pt) & board.by_color(enemy) & enemy_attackers;
    }

    let mut on_square = mover;
    let mut capture_side = enemy;
    let mut value = target_value;
    let mut prev_value = 0;
    let mut prev_prev_value;

    for _ in 2..MAX_PLY {
        let captured = on_square;
        prev_prev_value = prev_value;
        prev_value = value;

        // commit the capturing side's least valuable remaining attacker
        let mut next = None;
        for pt in LEAST_VALUABLE {
            let pool = remaining[capture_side as usize][pt as usize];
            if !pool.is_empty() {
                remaining[capture_side as usize][pt as usize] =
                    Bitboard::new(pool.as_u64() & (pool.as_u64() - 1));
                next = Some(pt);
                break;
            }
        }
        let Some(next_piece) = next else {
            // no recapture: the last capture stands
            return prev_value;
        };
        if captured == Piece::King {
            // the king could never have walked into the recapture
            return prev_prev_value;
        }

        if capture_side == side {
            value += captured.value();
        } else {
            value -= captured.value();
        }
        on_square = next_piece;
        capture_side = !capture_side;
    }

    value
}

/// Assign an ordering score to every move in `level`'s region of the stack:
/// the transposition table's remembered best move (from the previous,
/// one-shallower search of this position) scores infinite, everything else
/// its exchange estimate.
pub fn score_moves(
    board: &Board,
    stack: &mut MoveStack,
    level: usize,
    hash: u64,
    depth: i32,
    ttable: &TTable,
) {
    #[allow(clippy::cast_possible_truncation)]
    let hint = ttable
        .probe(
            hash,
            level as u8,
            (depth - 1).clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8,
            board.player,
        )
        .map(|entry| entry.best_move)
        .filter(|m| !m.is_sentinel());

    for entry in stack.level_mut(level) {
        entry.score = match hint {
            Some(h) if entry.m.same_action(h) => INFINITE,
            _ => see(board, entry.m),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{movegen, Square};
    use crate::engine::transposition::Bound;

    fn see_helper(fen: &str, m: Move) -> i32 {
        let board = Board::from_fen(fen).unwrap();
        see(&board, m)
    }

    #[test]
    fn free_pawn() {
        // a pawn takes an undefended pawn
        assert_eq!(
            see_helper(
                "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1",
                Move::new(Square::E4, Square::D5)
            ),
            100
        );
    }

    #[test]
    fn winning_capture_short_circuits() {
        // pawn takes queen: worth queen minus pawn on the spot
        assert_eq!(
            see_helper(
                "4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1",
                Move::new(Square::E4, Square::D5)
            ),
            800
        );
    }

    #[test]
    fn knight_for_defended_pawn() {
        // knight takes a pawn defended by a pawn: down knight for pawn
        assert_eq!(
            see_helper(
                "4k3/2p5/3p4/8/4N3/8/8/4K3 w - - 0 1",
                Move::new(Square::E4, Square::D6)
            ),
            100 - 300
        );
    }

    #[test]
    fn recapture_chain() {
        // RxR defended by a rook: the exchange nets nothing after the forced
        // recapture and counter-recapture
        assert_eq!(
            see_helper(
                "3rr1k1/8/8/8/8/8/8/3R2K1 w - - 0 1",
                Move::new(Square::D1, Square::D8)
            ),
            // Rxd8 (+500), Rxd8 (-500): the attacker pool then runs dry
            0
        );
    }

    #[test]
    fn quiet_moves_are_never_positive() {
        let board = Board::new();
        let mut stack = MoveStack::new();
        movegen::generate_all(&board, &mut stack, 0);
        for entry in stack.level_mut(0) {
            assert!(see(&board, entry.m) <= 0, "{} scored positive", entry.m);
        }
    }

    #[test]
    fn xray_backs_up_the_exchange() {
        // white queen takes a defended pawn with a rook stacked behind her:
        // QxP (+100), PxQ (-800), RxP (+100 - 800 + 100)
        assert_eq!(
            see_helper(
                "4k3/2p5/3p4/8/8/3Q4/3R4/4K3 w - - 0 1",
                Move::new(Square::D3, Square::D6)
            ),
            100 - 900 + 100
        );
    }

    #[test]
    fn table_hint_dominates() {
        let board = Board::new();
        let mut stack = MoveStack::new();
        movegen::generate_all(&board, &mut stack, 0);

        let hint = Move::new(Square::B1, Square::C3);
        let ttable = TTable::with_capacity(4, 100);
        ttable.store(board.hash, 0, 3, board.player, 25, Bound::Exact, hint);

        score_moves(&board, &mut stack, 0, board.hash, 4, &ttable);
        let best = stack.pop_best(0).unwrap();
        assert_eq!(best.m, hint);
        assert_eq!(best.score, INFINITE);
    }
}
