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

//! Heron is the core of a chess engine: a rotated-bitboard board
//! representation, legal move generation, a hand-tuned evaluator, and a
//! principal-variation search with a shared transposition table and a
//! background pondering worker.
//!
//! The crate deliberately stops at the engine boundary.
//! Front ends (interactive shells, protocol adapters, opening books)
//! drive it through [`engine::Engine`], feeding it wire-form moves such
//! as `e2e4` and asking for a best move under a wall-clock budget.

#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]

pub mod base;
pub mod engine;
