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

//! Transposition tables.
//!
//! A transposition table is a cache from position hashes to the result of
//! searching that position: if the same position is reached through multiple
//! move orders, the engine reuses its earlier work. It is also the one
//! channel through which the pondering worker's effort becomes visible to
//! the foreground search.
//!
//! The table is a power-of-two array of buckets, each individually locked
//! and holding a small vector of entries ordered by the level (root
//! distance) they were recorded at. Capacity is global: when the table
//! overflows, the entry farthest from the root in the fullest bucket is
//! evicted, preserving the expensive near-root results.
//!
//! Because the position hash covers piece placement only, every entry also
//! records the side to move, and lookups must match on it.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use crate::base::{Color, Move};

/// Default log2 of the number of buckets.
const DEFAULT_BUCKETS_LOG2: usize = 16;
/// Default global entry capacity.
const DEFAULT_CAPACITY: usize = 500_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// How the value of a transposition entry bounds the true value of its
/// position.
pub enum Bound {
    /// The value is exact.
    Exact,
    /// The value is a lower bound (the search failed high here).
    Lower,
    /// The value is an upper bound (the search failed low here).
    Upper,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// One cached search result.
pub struct TTEntry {
    /// The hash of the position searched.
    pub hash: u64,
    /// The level (plies from the root) the position was searched at.
    /// Doubles as the eviction priority: higher levels go first.
    pub level: u8,
    /// The remaining depth the position was searched to.
    /// Negative for quiescence results.
    pub depth: i8,
    /// The side to move in the position searched.
    pub side: Color,
    /// The value found.
    pub value: i32,
    /// How `value` bounds the true value.
    pub bound: Bound,
    /// The best move found, or [`Move::NONE`] if none was established.
    pub best_move: Move,
}

#[derive(Debug)]
/// A table of cached search results, sharable across threads.
/// Each bucket is independently locked; there is no cross-bucket
/// consistency, and none is needed.
pub struct TTable {
    /// The buckets. The length is always a power of two.
    buckets: Vec<Mutex<Vec<TTEntry>>>,
    /// Mask extracting a bucket index from a hash.
    mask: u64,
    /// The total number of entries across all buckets.
    len: AtomicUsize,
    /// The number of entries beyond which insertion evicts.
    capacity: usize,
}

impl TTable {
    #[must_use]
    /// Create a table with the default geometry.
    pub fn new() -> TTable {
        TTable::with_capacity(DEFAULT_BUCKETS_LOG2, DEFAULT_CAPACITY)
    }

    #[must_use]
    /// Create a table with `1 << buckets_log2` buckets holding at most
    /// `capacity` entries overall.
    pub fn with_capacity(buckets_log2: usize, capacity: usize) -> TTable {
        let n_buckets = 1usize << buckets_log2;
        let mut buckets = Vec::with_capacity(n_buckets);
        buckets.resize_with(n_buckets, || Mutex::new(Vec::new()));
        TTable {
            buckets,
            mask: (n_buckets - 1) as u64,
            len: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Get the bucket a hash belongs to.
    fn bucket(&self, hash: u64) -> &Mutex<Vec<TTEntry>> {
        #[allow(clippy::cast_possible_truncation)]
        &self.buckets[(hash & self.mask) as usize]
    }

    #[must_use]
    /// Look up the entry for a position, if a usable one exists.
    ///
    /// An entry fulfills the query if its hash and side to move match, it
    /// was searched at least `depth` deep, and it was recorded no deeper in
    /// the tree than `level`.
    ///
    /// # Panics
    ///
    /// Panics if the bucket lock was poisoned.
    pub fn probe(&self, hash: u64, level: u8, depth: i8, side: Color) -> Option<TTEntry> {
        let bucket = self.bucket(hash).lock().unwrap();
        for entry in bucket.iter() {
            // entries are ordered by level, so once past ours nothing fits
            if entry.level > level {
                return None;
            }
            if entry.hash == hash && entry.side == side && entry.depth >= depth {
                return Some(*entry);
            }
        }
        None
    }

    /// Record a search result, replacing any same-position entry it
    /// supersedes. Insertion always succeeds; if the table is over capacity
    /// afterwards, the deepest-from-root entry of the fullest bucket is
    /// evicted to make room.
    ///
    /// # Panics
    ///
    /// Panics if a bucket lock was poisoned.
    pub fn store(
        &self,
        hash: u64,
        level: u8,
        depth: i8,
        side: Color,
        value: i32,
        bound: Bound,
        best_move: Move,
    ) {
        let entry = TTEntry {
            hash,
            level,
            depth,
            side,
            value,
            bound,
            best_move,
        };
        {
            let mut bucket = self.bucket(hash).lock().unwrap();
            if let Some(i) = bucket
                .iter()
                .position(|e| e.hash == hash && e.side == side)
            {
                if bucket[i].depth > depth {
                    // a deeper result is already known; keep it
                    return;
                }
                bucket.remove(i);
                let at = bucket.partition_point(|e| e.level <= level);
                bucket.insert(at, entry);
                return;
            }
            let at = bucket.partition_point(|e| e.level <= level);
            bucket.insert(at, entry);
        }
        if self.len.fetch_add(1, Ordering::Relaxed) + 1 > self.capacity {
            self.evict_one();
        }
    }

    /// Drop the highest-level entry of the fullest bucket.
    fn evict_one(&self) {
        let mut fullest = 0;
        let mut fullest_len = 0;
        for (i, bucket) in self.buckets.iter().enumerate() {
            let n = bucket.lock().unwrap().len();
            if n > fullest_len {
                fullest = i;
                fullest_len = n;
            }
        }
        if fullest_len > 0 && self.buckets[fullest].lock().unwrap().pop().is_some() {
            self.len.fetch_sub(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    /// Get the number of entries currently stored.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    #[must_use]
    /// Determine whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, e.g. between games.
    ///
    /// # Panics
    ///
    /// Panics if a bucket lock was poisoned.
    pub fn clear(&self) {
        for bucket in &self.buckets {
            bucket.lock().unwrap().clear();
        }
        self.len.store(0, Ordering::Relaxed);
    }
}

impl Default for TTable {
    fn default() -> TTable {
        TTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Square;

    /// Shorthand for storing a plain exact entry.
    fn put(table: &TTable, hash: u64, level: u8, depth: i8, value: i32) {
        table.store(
            hash,
            level,
            depth,
            Color::White,
            value,
            Bound::Exact,
            Move::new(Square::E2, Square::E4),
        );
    }

    #[test]
    fn probe_miss() {
        let table = TTable::with_capacity(4, 100);
        assert!(table.probe(12345, 10, 0, Color::White).is_none());
    }

    #[test]
    fn probe_hit_requires_all_conditions() {
        let table = TTable::with_capacity(4, 100);
        put(&table, 99, 3, 5, 17);

        // straightforward hit
        let entry = table.probe(99, 3, 5, Color::White).unwrap();
        assert_eq!(entry.value, 17);

        // a shallower requirement is also satisfied
        assert!(table.probe(99, 5, 2, Color::White).is_some());

        // too deep a requirement misses
        assert!(table.probe(99, 3, 6, Color::White).is_none());
        // a query above the recorded level misses
        assert!(table.probe(99, 2, 5, Color::White).is_none());
        // the wrong side to move misses
        assert!(table.probe(99, 3, 5, Color::Black).is_none());
        // the wrong hash misses
        assert!(table.probe(98, 3, 5, Color::White).is_none());
    }

    #[test]
    fn deeper_results_replace_shallower() {
        let table = TTable::with_capacity(4, 100);
        put(&table, 7, 2, 3, 10);
        put(&table, 7, 2, 6, 20);
        assert_eq!(table.probe(7, 2, 3, Color::White).unwrap().value, 20);
        assert_eq!(table.len(), 1);

        // a shallower store does not clobber the deeper entry
        put(&table, 7, 2, 1, 30);
        assert_eq!(table.probe(7, 2, 3, Color::White).unwrap().value, 20);
    }

    #[test]
    fn sides_are_distinct_positions() {
        let table = TTable::with_capacity(4, 100);
        table.store(5, 1, 4, Color::White, 1, Bound::Exact, Move::NONE);
        table.store(5, 1, 4, Color::Black, -1, Bound::Exact, Move::NONE);
        assert_eq!(table.len(), 2);
        assert_eq!(table.probe(5, 1, 4, Color::White).unwrap().value, 1);
        assert_eq!(table.probe(5, 1, 4, Color::Black).unwrap().value, -1);
    }

    #[test]
    fn eviction_prefers_high_levels() {
        let table = TTable::with_capacity(0, 3);
        // one bucket: everything collides, so the fullest bucket is this one
        put(&table, 1, 1, 1, 0);
        put(&table, 2, 9, 1, 0);
        put(&table, 3, 4, 1, 0);
        assert_eq!(table.len(), 3);
        put(&table, 4, 2, 1, 0);
        // the level-9 entry was the victim
        assert_eq!(table.len(), 3);
        assert!(table.probe(2, 10, 0, Color::White).is_none());
        assert!(table.probe(1, 10, 0, Color::White).is_some());
        assert!(table.probe(3, 10, 0, Color::White).is_some());
        assert!(table.probe(4, 10, 0, Color::White).is_some());
    }

    #[test]
    fn clear_empties() {
        let table = TTable::with_capacity(4, 100);
        put(&table, 1, 1, 1, 0);
        assert!(!table.is_empty());
        table.clear();
        assert!(table.is_empty());
        assert!(table.probe(1, 10, 0, Color::White).is_none());
    }
}
