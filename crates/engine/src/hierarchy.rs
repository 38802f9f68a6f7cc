//! The host hierarchy: global scope, worlds and their regions.
//!
//! Single source of truth for every host and the entry point for both
//! structural mutation and queries.
//!
//! ## Locking
//!
//! | lock             | guards                               | taken by            |
//! |------------------|--------------------------------------|---------------------|
//! | `directory`      | zone name -> (world, id), capacity   | structural changes  |
//! | `worlds`         | world id -> `WorldHost`              | briefly, everyone   |
//! | world `index`    | regions of one world + point cache   | lookups (shared)    |
//! | settings maps    | one per host                         | setting reads/edits |
//!
//! Lock order is directory, then worlds, then a world index. Lookups never
//! take the directory lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{MoveError, ZoneError};
use crate::geometry::{Bounds, Location, Vector3i, WorldId};
use crate::host::{GlobalHost, Host, WorldHost};
use crate::point_cache::CacheStats;
use crate::region::{self, Region, RegionId, RegionSnapshot};
use crate::registry::SettingRegistry;
use crate::resolver::{self, Resolution};
use crate::setting::{SettingData, SettingKey, SettingType};
use crate::settings_map::SettingsMap;
use crate::spatial_index::SpatialIndex;
use crate::target::Subject;

/// Default number of cached points per world
pub const DEFAULT_CACHE_SIZE: usize = 4096;
/// Worlds with fewer regions than this scan directly
pub const DEFAULT_CACHE_MIN_REGIONS: usize = 16;
/// Default process-wide region limit
pub const DEFAULT_MAX_REGIONS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyOptions {
    /// Point cache capacity per world. 0 disables caching.
    pub cache_size: usize,
    /// Worlds with fewer regions than this skip the cache
    pub cache_min_regions: usize,
    /// Process-wide region limit
    pub max_regions: usize,
    /// Per-world cache capacity overrides
    pub world_cache_sizes: HashMap<WorldId, usize>,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            cache_min_regions: DEFAULT_CACHE_MIN_REGIONS,
            max_regions: DEFAULT_MAX_REGIONS,
            world_cache_sizes: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ZoneEntry {
    world: WorldId,
    id: RegionId,
}

type Directory = FxHashMap<String, ZoneEntry>;

pub struct HostHierarchy {
    registry: Arc<SettingRegistry>,
    options: HierarchyOptions,
    global: Arc<GlobalHost>,
    worlds: RwLock<FxHashMap<WorldId, Arc<WorldHost>>>,
    directory: RwLock<Directory>,
    next_region_id: AtomicU64,
}

impl HostHierarchy {
    pub fn new(registry: Arc<SettingRegistry>, options: HierarchyOptions) -> Self {
        Self {
            registry,
            options,
            global: Arc::new(GlobalHost::new()),
            worlds: RwLock::new(FxHashMap::default()),
            directory: RwLock::new(FxHashMap::default()),
            next_region_id: AtomicU64::new(1),
        }
    }

    /// Hierarchy over the built-in flags with default options
    pub fn with_builtin_flags() -> Self {
        Self::new(SettingRegistry::builtin(), HierarchyOptions::default())
    }

    pub fn registry(&self) -> &Arc<SettingRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &HierarchyOptions {
        &self.options
    }

    pub fn global(&self) -> Host {
        Host::Global(Arc::clone(&self.global))
    }

    fn generate_region_id(&self) -> RegionId {
        RegionId(self.next_region_id.fetch_add(1, Ordering::Relaxed))
    }

    // ========================================================================
    // Worlds
    // ========================================================================

    /// Register a world. Idempotent: an existing world with the same id is
    /// returned unchanged.
    pub fn add_world(&self, id: WorldId, name: impl Into<String>) -> Arc<WorldHost> {
        let mut worlds = self.worlds.write();
        if let Some(existing) = worlds.get(&id) {
            return Arc::clone(existing);
        }
        let name = name.into();
        let cache_size = self
            .options
            .world_cache_sizes
            .get(&id)
            .copied()
            .unwrap_or(self.options.cache_size);
        let index = SpatialIndex::new(cache_size, self.options.cache_min_regions);
        let world = Arc::new(WorldHost::new(id, name, index));
        worlds.insert(id, Arc::clone(&world));
        log::info!("world '{}' ({}) registered, cache size {}", world.name(), id, cache_size);
        world
    }

    /// Unregister a world together with all of its regions
    pub fn remove_world(&self, id: WorldId) -> Option<Arc<WorldHost>> {
        let mut directory = self.directory.write();
        let world = self.worlds.write().remove(&id)?;
        let before = directory.len();
        directory.retain(|_, entry| entry.world != id);
        log::info!(
            "world '{}' ({}) removed with {} zones",
            world.name(),
            id,
            before - directory.len()
        );
        Some(world)
    }

    pub fn world(&self, id: WorldId) -> Option<Arc<WorldHost>> {
        self.worlds.read().get(&id).cloned()
    }

    /// All worlds, sorted by name
    pub fn worlds(&self) -> Vec<Arc<WorldHost>> {
        let mut worlds: Vec<_> = self.worlds.read().values().cloned().collect();
        worlds.sort_by(|a, b| region::cmp_names(a.name(), b.name()));
        worlds
    }

    // ========================================================================
    // Structural mutation
    // ========================================================================

    /// Create a zone with an empty settings map. Returns a live handle.
    pub fn add_zone(
        &self,
        name: &str,
        world: WorldId,
        min: Vector3i,
        max: Vector3i,
        priority: i32,
    ) -> Result<Arc<Region>, ZoneError> {
        self.add_zone_with_settings(name, world, min, max, priority, SettingsMap::new())
    }

    /// Create a zone seeded with `settings`
    pub fn add_zone_with_settings(
        &self,
        name: &str,
        world: WorldId,
        min: Vector3i,
        max: Vector3i,
        priority: i32,
        settings: SettingsMap,
    ) -> Result<Arc<Region>, ZoneError> {
        let bounds = Bounds::new(min, max)?;
        let mut directory = self.directory.write();
        self.insert_zone(&mut directory, name, world, bounds, priority, settings)
    }

    /// Re-create a zone from a snapshot returned by `remove_zone`
    pub fn restore_zone(&self, snapshot: RegionSnapshot) -> Result<Arc<Region>, ZoneError> {
        let mut directory = self.directory.write();
        self.insert_zone(
            &mut directory,
            &snapshot.name,
            snapshot.world,
            snapshot.bounds,
            snapshot.priority,
            snapshot.settings,
        )
    }

    fn insert_zone(
        &self,
        directory: &mut Directory,
        name: &str,
        world_id: WorldId,
        bounds: Bounds,
        priority: i32,
        settings: SettingsMap,
    ) -> Result<Arc<Region>, ZoneError> {
        if !region::is_valid_zone_name(name) {
            return Err(ZoneError::InvalidName(name.to_string()));
        }
        let key = region::name_key(name);
        if directory.contains_key(&key) {
            return Err(ZoneError::DuplicateName(name.to_string()));
        }
        if directory.len() >= self.options.max_regions {
            return Err(ZoneError::CapacityExceeded {
                limit: self.options.max_regions,
            });
        }
        let world = self.world(world_id).ok_or(ZoneError::WorldNotFound(world_id))?;
        if let Some(key) = self.first_global_only(&settings) {
            return Err(ZoneError::GlobalOnlySetting {
                zone: name.to_string(),
                key: key.to_string(),
            });
        }

        let id = self.generate_region_id();
        let region = Arc::new(Region::new(
            id,
            name.to_string(),
            world_id,
            bounds,
            priority,
            settings,
        ));
        let dropped = world.index_mut().insert(Arc::clone(&region));
        directory.insert(key, ZoneEntry { world: world_id, id });
        log::debug!(
            "zone '{}' {} added to world '{}' at {}, priority {}, {} cached points invalidated",
            name,
            id,
            world.name(),
            bounds,
            priority,
            dropped
        );
        Ok(region)
    }

    fn first_global_only(&self, settings: &SettingsMap) -> Option<&'static str> {
        settings
            .entries()
            .into_iter()
            .map(|(id, _)| id)
            .find(|id| self.registry.get(id).is_some_and(|d| d.meta.global_only))
    }

    /// Remove a zone, returning its last state
    pub fn remove_zone(&self, name: &str) -> Result<RegionSnapshot, ZoneError> {
        let mut directory = self.directory.write();
        self.take_zone(&mut directory, name)
    }

    fn take_zone(&self, directory: &mut Directory, name: &str) -> Result<RegionSnapshot, ZoneError> {
        let entry = directory
            .remove(&region::name_key(name))
            .ok_or_else(|| ZoneError::NotFound(name.to_string()))?;
        let removed = self
            .world(entry.world)
            .and_then(|world| world.index_mut().remove(entry.id));
        match removed {
            Some((region, dropped)) => {
                log::debug!(
                    "zone '{}' {} removed, {} cached points invalidated",
                    region.name(),
                    entry.id,
                    dropped
                );
                Ok(region.snapshot())
            }
            None => {
                // Directory and index out of step; the directory entry is gone now.
                log::warn!("zone '{}' was in the directory but not in its world index", name);
                Err(ZoneError::NotFound(name.to_string()))
            }
        }
    }

    /// Relocate or resize a zone: remove it, then re-add it with the same
    /// name, priority and settings.
    ///
    /// If the re-add fails the original is restored and `Rejected` is
    /// returned. The directory lock is held from removal to restore and the
    /// restore reuses the name, slot and world just freed, so it cannot fail
    /// while those invariants hold. `ZoneLost` (logged at error level) is the
    /// report for a broken invariant, not an expected outcome.
    pub fn move_zone(
        &self,
        name: &str,
        world: WorldId,
        min: Vector3i,
        max: Vector3i,
    ) -> Result<Arc<Region>, MoveError> {
        let mut directory = self.directory.write();
        let original = self
            .take_zone(&mut directory, name)
            .map_err(MoveError::Rejected)?;

        let placed = Bounds::new(min, max).and_then(|bounds| {
            self.insert_zone(
                &mut directory,
                &original.name,
                world,
                bounds,
                original.priority,
                original.settings.clone(),
            )
        });

        match placed {
            Ok(region) => Ok(region),
            Err(cause) => {
                let name = original.name.clone();
                let world = original.world;
                match self.insert_zone(
                    &mut directory,
                    &original.name,
                    original.world,
                    original.bounds,
                    original.priority,
                    original.settings,
                ) {
                    Ok(_) => Err(MoveError::Rejected(cause)),
                    Err(restore) => {
                        log::error!(
                            "zone '{}' in world {} was LOST while moving: move failed ({}), restore failed ({})",
                            name,
                            world,
                            cause,
                            restore
                        );
                        Err(MoveError::ZoneLost { cause, restore })
                    }
                }
            }
        }
    }

    /// Change a zone's priority in place, returning the previous priority.
    ///
    /// Holds the directory lock so a concurrent `move_zone` cannot snapshot
    /// the old priority between the lookup and the write.
    pub fn set_priority(&self, name: &str, priority: i32) -> Result<i32, ZoneError> {
        let directory = self.directory.read();
        let region = directory
            .get(&region::name_key(name))
            .and_then(|entry| self.live_region(*entry))
            .ok_or_else(|| ZoneError::NotFound(name.to_string()))?;
        Ok(region.set_priority(priority))
    }

    // ========================================================================
    // Zone queries
    // ========================================================================

    /// Live handle to a zone by name (case-insensitive)
    pub fn zone(&self, name: &str) -> Option<Arc<Region>> {
        let entry = *self.directory.read().get(&region::name_key(name))?;
        self.live_region(entry)
    }

    fn live_region(&self, entry: ZoneEntry) -> Option<Arc<Region>> {
        let world = self.world(entry.world)?;
        let index = world.index();
        index.get(entry.id).cloned()
    }

    /// Zones of one world, sorted by name
    pub fn zones_in(&self, world: WorldId) -> Vec<Arc<Region>> {
        let Some(world) = self.world(world) else {
            return Vec::new();
        };
        let mut zones: Vec<_> = world.index().regions().cloned().collect();
        zones.sort_by(|a, b| region::cmp_names(a.name(), b.name()));
        zones
    }

    /// Total number of zones across all worlds
    pub fn zone_count(&self) -> usize {
        self.directory.read().len()
    }

    /// Zones of `world` overlapping `bounds`, sorted by name
    pub fn zones_intersecting(&self, world: WorldId, bounds: &Bounds) -> Vec<Arc<Region>> {
        let Some(world) = self.world(world) else {
            return Vec::new();
        };
        let mut zones = world.index().intersecting(bounds);
        zones.sort_by(|a, b| region::cmp_names(a.name(), b.name()));
        zones
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Every host applicable at `location`: containing regions by priority
    /// (ties by name), then the world, then global.
    pub fn containing_hosts(&self, location: Location) -> Vec<Host> {
        self.collect_hosts(location, |index, pos| index.containing(pos))
    }

    /// Same as `containing_hosts`, bypassing the point cache
    pub fn containing_hosts_uncached(&self, location: Location) -> Vec<Host> {
        self.collect_hosts(location, |index, pos| index.scan(pos))
    }

    fn collect_hosts<Ids: AsRef<[RegionId]>>(
        &self,
        location: Location,
        find: impl Fn(&SpatialIndex, Vector3i) -> Ids,
    ) -> Vec<Host> {
        let Some(world) = self.world(location.world) else {
            return vec![self.global()];
        };
        let mut ranked: Vec<(i32, Arc<Region>)> = {
            let index = world.index();
            let ids = find(&*index, location.position);
            ids.as_ref()
                .iter()
                .filter_map(|id| index.get(*id))
                .map(|r| (r.priority(), Arc::clone(r)))
                .collect()
        };
        region::sort_ranked(&mut ranked);

        let mut hosts = Vec::with_capacity(ranked.len() + 2);
        hosts.extend(ranked.into_iter().map(|(_, r)| Host::Region(r)));
        hosts.push(Host::World(world));
        hosts.push(self.global());
        hosts
    }

    /// Effective value of `key` at `location` for `actor`
    pub fn lookup<T: SettingType>(
        &self,
        key: &SettingKey<T>,
        location: Location,
        actor: Option<&dyn Subject>,
    ) -> T {
        self.resolve(key, location, actor).value
    }

    /// Effective value plus the host that supplied it
    pub fn resolve<T: SettingType>(
        &self,
        key: &SettingKey<T>,
        location: Location,
        actor: Option<&dyn Subject>,
    ) -> Resolution<T> {
        debug_assert!(
            self.registry.contains(key.id()),
            "lookup of unregistered setting '{}'",
            key.id()
        );
        resolver::resolve(&self.containing_hosts(location), key, actor)
    }

    /// Erased lookup by id, for the command layer. `None` if the id is not registered.
    pub fn lookup_raw(
        &self,
        id: &str,
        location: Location,
        actor: Option<&dyn Subject>,
    ) -> Option<SettingData> {
        let descriptor = self.registry.get(id)?;
        let hosts = self.containing_hosts(location);
        Some(resolver::resolve_data(&hosts, id, &descriptor.default, actor).0)
    }

    /// Hosts above `host`: region -> world -> global, world -> global
    fn parents_of(&self, host: &Host) -> Vec<Host> {
        match host {
            Host::Global(_) => Vec::new(),
            Host::World(_) => vec![self.global()],
            Host::Region(r) => {
                let mut parents = Vec::with_capacity(2);
                if let Some(world) = self.world(r.world()) {
                    parents.push(Host::World(world));
                }
                parents.push(self.global());
                parents
            }
        }
    }

    /// True if `host`'s own value for `key` equals what its parents resolve
    /// to for an anonymous lookup. Advisory only.
    pub fn is_redundant<T: SettingType>(&self, host: &Host, key: &SettingKey<T>) -> bool {
        let default = key.default_value().to_data();
        resolver::is_redundant(host, &self.parents_of(host), key.id(), &default)
    }

    /// Erased form of `is_redundant`. False for unregistered ids.
    pub fn is_redundant_raw(&self, host: &Host, id: &str) -> bool {
        match self.registry.get(id) {
            Some(descriptor) => {
                resolver::is_redundant(host, &self.parents_of(host), id, &descriptor.default)
            }
            None => false,
        }
    }

    /// Point cache counters of one world
    pub fn cache_stats(&self, world: WorldId) -> Option<CacheStats> {
        self.world(world).map(|w| w.cache_stats())
    }
}
