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

//! Search limiting.
//!
//! A search must not run forever; the limit carries its wall-clock deadline
//! and a stop flag that other threads can raise. The search polls the limit
//! cooperatively: once after popping each move, and once between deepening
//! iterations. Aborted nodes return their running bound and the driver keeps
//! the best completed answer.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        RwLock,
    },
    time::{Duration, Instant},
};

#[derive(Debug)]
/// A limit to how long a search may run.
/// Shared between the searching thread and whoever may want to stop it.
pub struct SearchLimit {
    /// Whether the search has been told to stop, regardless of the clock.
    over: AtomicBool,
    /// The wall-clock instant the search must stop at.
    /// `None` for an unlimited search.
    deadline: RwLock<Option<Instant>>,
}

impl SearchLimit {
    #[must_use]
    /// Create a new limit which will never stop a search on its own.
    pub fn new() -> SearchLimit {
        SearchLimit {
            over: AtomicBool::new(false),
            deadline: RwLock::new(None),
        }
    }

    /// Arm the limit: clear the stop flag and set the deadline `duration`
    /// from now, or to infinity when `duration` is `None`.
    ///
    /// # Panics
    ///
    /// Panics if the deadline lock was poisoned.
    pub fn start(&self, duration: Option<Duration>) {
        *self.deadline.write().unwrap() = duration.map(|d| Instant::now() + d);
        self.over.store(false, Ordering::Relaxed);
    }

    /// Stop the search immediately: raise the stop flag and pull the
    /// deadline into the past, so that both kinds of poll notice.
    ///
    /// # Panics
    ///
    /// Panics if the deadline lock was poisoned.
    pub fn stop(&self) {
        *self.deadline.write().unwrap() = Some(Instant::now());
        self.over.store(true, Ordering::Relaxed);
    }

    #[must_use]
    /// Poll whether the search must wind down now.
    ///
    /// # Panics
    ///
    /// Panics if the deadline lock was poisoned.
    pub fn is_over(&self) -> bool {
        if self.over.load(Ordering::Relaxed) {
            return true;
        }
        match *self.deadline.read().unwrap() {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

impl Default for SearchLimit {
    fn default() -> SearchLimit {
        SearchLimit::new()
    }
}
