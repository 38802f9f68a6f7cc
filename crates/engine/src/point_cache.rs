//! Bounded LRU cache of point containment results.
//!
//! Maps a block position to the ids of the regions containing it. The cache
//! stores containment only; priority ordering is applied per query, so a
//! priority change never makes an entry stale.
//!
//! Recency is tracked with a monotonically increasing stamp per entry and an
//! ordered stamp index, so both bumping and evicting are O(log n).

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::geometry::{Bounds, Vector3i};
use crate::region::RegionId;

/// Counters reported by `PointCache::stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub len: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache (0.0 when unused)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry {
    regions: Arc<[RegionId]>,
    stamp: u64,
}

#[derive(Debug)]
pub struct PointCache {
    capacity: usize,
    entries: FxHashMap<Vector3i, Entry>,
    recency: BTreeMap<u64, Vector3i>,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    invalidations: u64,
}

impl PointCache {
    /// Create a cache holding at most `capacity` points. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: FxHashMap::default(),
            recency: BTreeMap::new(),
            clock: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            invalidations: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up a point, marking it most recently used on a hit
    pub fn get(&mut self, pos: Vector3i) -> Option<Arc<[RegionId]>> {
        let stamp = self.tick();
        match self.entries.get_mut(&pos) {
            Some(entry) => {
                self.recency.remove(&entry.stamp);
                entry.stamp = stamp;
                self.recency.insert(stamp, pos);
                self.hits += 1;
                Some(Arc::clone(&entry.regions))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a result, evicting the least recently used point when full
    pub fn insert(&mut self, pos: Vector3i, regions: Arc<[RegionId]>) {
        if self.capacity == 0 {
            return;
        }
        let stamp = self.tick();
        if let Some(entry) = self.entries.get_mut(&pos) {
            self.recency.remove(&entry.stamp);
            entry.stamp = stamp;
            entry.regions = regions;
            self.recency.insert(stamp, pos);
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.recency.pop_first() {
                Some((_, oldest)) => {
                    self.entries.remove(&oldest);
                    self.evictions += 1;
                }
                None => break,
            }
        }
        self.entries.insert(pos, Entry { regions, stamp });
        self.recency.insert(stamp, pos);
    }

    /// Drop every cached point inside `bounds`. Returns how many were dropped.
    pub fn invalidate_within(&mut self, bounds: &Bounds) -> usize {
        let before = self.entries.len();
        let recency = &mut self.recency;
        self.entries.retain(|pos, entry| {
            if bounds.contains(*pos) {
                recency.remove(&entry.stamp);
                false
            } else {
                true
            }
        });
        let dropped = before - self.entries.len();
        self.invalidations += dropped as u64;
        dropped
    }

    /// Drop everything. Counters are kept.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.recency.clear();
        self.invalidations += dropped as u64;
        dropped
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.capacity,
            len: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            invalidations: self.invalidations,
        }
    }
}
