//! Per-world index of regions answering "which regions contain this point".
//!
//! The index is a flat map scanned linearly; region counts per world are in
//! the hundreds at most and the point cache absorbs repeated queries. Worlds
//! with few regions skip the cache entirely, since a scan is as cheap as the
//! cache's own bookkeeping.
//!
//! # Consistency
//!
//! The owning world keeps the index behind an `RwLock`. Readers hold the
//! shared lock for the whole query, so a cache fill always reflects the
//! region set it was computed from. Writers hold the exclusive lock while
//! inserting or removing and invalidate the affected bounds before
//! releasing it.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::geometry::{Bounds, Vector3i};
use crate::point_cache::{CacheStats, PointCache};
use crate::region::{Region, RegionId};

#[derive(Debug)]
pub struct SpatialIndex {
    regions: FxHashMap<RegionId, Arc<Region>>,
    cache: Mutex<PointCache>,
    cache_min_regions: usize,
}

impl SpatialIndex {
    pub fn new(cache_size: usize, cache_min_regions: usize) -> Self {
        Self {
            regions: FxHashMap::default(),
            cache: Mutex::new(PointCache::new(cache_size)),
            cache_min_regions,
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: RegionId) -> Option<&Arc<Region>> {
        self.regions.get(&id)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Arc<Region>> {
        self.regions.values()
    }

    /// Add a region and drop cached points it now covers.
    /// Returns the number of cache entries invalidated.
    pub fn insert(&mut self, region: Arc<Region>) -> usize {
        let bounds = region.bounds();
        self.regions.insert(region.id(), region);
        self.cache.get_mut().invalidate_within(&bounds)
    }

    /// Remove a region and drop cached points it covered
    pub fn remove(&mut self, id: RegionId) -> Option<(Arc<Region>, usize)> {
        let region = self.regions.remove(&id)?;
        let dropped = self.cache.get_mut().invalidate_within(&region.bounds());
        Some((region, dropped))
    }

    /// Ids of all regions containing `pos`, in ascending id order
    pub fn containing(&self, pos: Vector3i) -> Arc<[RegionId]> {
        if self.regions.len() < self.cache_min_regions {
            return self.scan(pos).into();
        }
        if let Some(hit) = self.cache.lock().get(pos) {
            return hit;
        }
        // The cache mutex is released during the scan; the region set cannot
        // change while the caller holds the index read lock.
        let found: Arc<[RegionId]> = self.scan(pos).into();
        self.cache.lock().insert(pos, Arc::clone(&found));
        found
    }

    /// Uncached linear scan, in ascending id order
    pub fn scan(&self, pos: Vector3i) -> Vec<RegionId> {
        let mut ids: Vec<RegionId> = self
            .regions
            .values()
            .filter(|r| r.contains(pos))
            .map(|r| r.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Regions whose bounds share at least one block with `bounds`
    pub fn intersecting(&self, bounds: &Bounds) -> Vec<Arc<Region>> {
        self.regions
            .values()
            .filter(|r| r.bounds().intersects(bounds))
            .cloned()
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    pub fn clear_cache(&self) -> usize {
        self.cache.lock().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WorldId;
    use crate::settings_map::SettingsMap;

    fn v(x: i32, y: i32, z: i32) -> Vector3i {
        Vector3i::new(x, y, z)
    }

    fn region(id: u64, min: Vector3i, max: Vector3i) -> Arc<Region> {
        Arc::new(Region::new(
            RegionId(id),
            format!("r{id}"),
            WorldId::from_u128(1),
            Bounds::new(min, max).unwrap(),
            0,
            SettingsMap::new(),
        ))
    }

    #[test]
    fn test_containing_matches_scan() {
        let mut index = SpatialIndex::new(64, 0);
        index.insert(region(1, v(0, 0, 0), v(10, 10, 10)));
        index.insert(region(2, v(2, 2, 2), v(4, 4, 4)));
        index.insert(region(3, v(20, 0, 0), v(30, 5, 5)));

        assert_eq!(&*index.containing(v(3, 3, 3)), &[RegionId(1), RegionId(2)]);
        assert_eq!(&*index.containing(v(1, 1, 1)), &[RegionId(1)]);
        assert!(index.containing(v(15, 0, 0)).is_empty());
        assert_eq!(index.scan(v(25, 1, 1)), vec![RegionId(3)]);
    }

    #[test]
    fn test_second_query_hits_cache() {
        let mut index = SpatialIndex::new(64, 0);
        index.insert(region(1, v(0, 0, 0), v(10, 10, 10)));
        index.containing(v(1, 1, 1));
        index.containing(v(1, 1, 1));
        let stats = index.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_small_world_bypasses_cache() {
        let mut index = SpatialIndex::new(64, 4);
        index.insert(region(1, v(0, 0, 0), v(10, 10, 10)));
        index.containing(v(1, 1, 1));
        index.containing(v(1, 1, 1));
        let stats = index.cache_stats();
        assert_eq!(stats.hits + stats.misses, 0);
        assert_eq!(stats.len, 0);
    }

    #[test]
    fn test_insert_invalidates_covered_points() {
        let mut index = SpatialIndex::new(64, 0);
        index.insert(region(1, v(0, 0, 0), v(10, 10, 10)));
        assert_eq!(index.containing(v(3, 3, 3)).len(), 1);
        assert_eq!(index.containing(v(50, 0, 0)).len(), 0);

        let dropped = index.insert(region(2, v(2, 2, 2), v(4, 4, 4)));
        assert_eq!(dropped, 1);
        assert_eq!(index.containing(v(3, 3, 3)).len(), 2);
        // Point outside the new bounds stayed cached
        assert_eq!(index.cache_stats().len, 2);
    }

    #[test]
    fn test_remove_invalidates() {
        let mut index = SpatialIndex::new(64, 0);
        index.insert(region(1, v(0, 0, 0), v(10, 10, 10)));
        assert_eq!(index.containing(v(3, 3, 3)).len(), 1);

        let (removed, dropped) = index.remove(RegionId(1)).unwrap();
        assert_eq!(removed.id(), RegionId(1));
        assert_eq!(dropped, 1);
        assert!(index.containing(v(3, 3, 3)).is_empty());
        assert!(index.remove(RegionId(1)).is_none());
    }

    #[test]
    fn test_intersecting() {
        let mut index = SpatialIndex::new(0, 0);
        index.insert(region(1, v(0, 0, 0), v(10, 10, 10)));
        index.insert(region(2, v(20, 0, 0), v(30, 10, 10)));
        let probe = Bounds::new(v(8, 0, 0), v(12, 1, 1)).unwrap();
        let hits: Vec<RegionId> = index.intersecting(&probe).iter().map(|r| r.id()).collect();
        assert_eq!(hits, vec![RegionId(1)]);
    }

    /// Lookup throughput on a dense world. Run with:
    /// cargo test -p zoneguard-engine --release -- --ignored bench_containing --nocapture
    #[test]
    #[ignore]
    fn bench_containing() {
        let mut index = SpatialIndex::new(4096, 16);
        let mut id = 0;
        for gx in 0..20 {
            for gz in 0..20 {
                id += 1;
                let min = v(gx * 50, 0, gz * 50);
                index.insert(region(id, min, v(min.x + 60, 255, min.z + 60)));
            }
        }

        let iterations = 1_000_000;
        let start = std::time::Instant::now();
        let mut total = 0usize;
        for i in 0..iterations {
            let pos = v((i % 64) * 15, 64, (i / 64 % 64) * 15);
            total += index.containing(pos).len();
        }
        let elapsed = start.elapsed();

        println!("=== containing() benchmark ===");
        println!("Regions: {}", index.len());
        println!("Lookups: {iterations}");
        println!("Total: {:?} ({:.0} ns/lookup)", elapsed, elapsed.as_nanos() as f64 / iterations as f64);
        println!("Cache: {:?}", index.cache_stats());
        assert!(total > 0);

        // Same grid through the hierarchy, where cache hits also build the host list
        use crate::geometry::{Location, WorldId};
        use crate::hierarchy::HostHierarchy;

        let hierarchy = HostHierarchy::with_builtin_flags();
        let world = WorldId::from_u128(1);
        hierarchy.add_world(world, "bench");
        for r in index.regions() {
            let b = r.bounds();
            hierarchy
                .add_zone(&format!("z{}", r.id().0), world, b.min(), b.max(), 0)
                .unwrap();
        }

        let start = std::time::Instant::now();
        let mut total = 0usize;
        for i in 0..iterations {
            let pos = v((i % 64) * 15, 64, (i / 64 % 64) * 15);
            total += hierarchy.containing_hosts(Location { world, position: pos }).len();
        }
        let elapsed = start.elapsed();

        println!("=== containing_hosts() benchmark ===");
        println!("Total: {:?} ({:.0} ns/lookup)", elapsed, elapsed.as_nanos() as f64 / iterations as f64);
        println!("Cache: {:?}", hierarchy.cache_stats(world));
        assert!(total > 0);
    }
}
