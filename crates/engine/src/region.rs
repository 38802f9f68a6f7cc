//! Regions (zones): named bounding boxes carrying a priority and settings.
//!
//! Identity (id, name, world, bounds) never changes after creation. Resizing
//! or relocating a region is a remove followed by a re-add, so the spatial
//! index never sees a half-updated box. Priority and settings are mutable in
//! place.

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Vector3i, WorldId};
use crate::settings_map::SettingsMap;

/// Stable region identifier. Monotonic within a hierarchy, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live zone. Shared by `Arc` between the world index and callers.
#[derive(Debug)]
pub struct Region {
    id: RegionId,
    name: String,
    world: WorldId,
    bounds: Bounds,
    priority: AtomicI32,
    settings: RwLock<SettingsMap>,
}

impl Region {
    pub(crate) fn new(
        id: RegionId,
        name: String,
        world: WorldId,
        bounds: Bounds,
        priority: i32,
        settings: SettingsMap,
    ) -> Self {
        Self {
            id,
            name,
            world,
            bounds,
            priority: AtomicI32::new(priority),
            settings: RwLock::new(settings),
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Name as the operator typed it
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> WorldId {
        self.world
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn priority(&self) -> i32 {
        self.priority.load(AtomicOrdering::Acquire)
    }

    /// Change the priority in place. Containment is unaffected, so cached
    /// point results stay valid; ordering is computed per query.
    pub(crate) fn set_priority(&self, priority: i32) -> i32 {
        self.priority.swap(priority, AtomicOrdering::AcqRel)
    }

    #[inline]
    pub fn contains(&self, pos: Vector3i) -> bool {
        self.bounds.contains(pos)
    }

    pub fn settings(&self) -> RwLockReadGuard<'_, SettingsMap> {
        self.settings.read()
    }

    /// Unchecked write access. External edits go through `Host::put`, which
    /// enforces the global-only scope rule.
    pub(crate) fn settings_mut(&self) -> RwLockWriteGuard<'_, SettingsMap> {
        self.settings.write()
    }

    /// Value copy of this region's current state
    pub fn snapshot(&self) -> RegionSnapshot {
        RegionSnapshot {
            name: self.name.clone(),
            world: self.world,
            bounds: self.bounds,
            priority: self.priority(),
            settings: self.settings.read().clone(),
        }
    }
}

/// Detached copy of a region, returned by `remove_zone` and used to restore it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSnapshot {
    pub name: String,
    pub world: WorldId,
    pub bounds: Bounds,
    pub priority: i32,
    pub settings: SettingsMap,
}

/// Check a zone name: non-empty, ASCII letters, digits, `_` and `-`
pub fn is_valid_zone_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Directory key for a zone name (names are case-insensitive)
pub(crate) fn name_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Sort `(priority, region)` pairs into resolution order: higher priority
/// first, then name ascending (case-insensitive, then exact for a total
/// order). Priorities are read once by the caller, so a concurrent
/// `set_priority` cannot break the sort.
pub(crate) fn sort_ranked(ranked: &mut [(i32, Arc<Region>)]) {
    ranked.sort_by(|(pa, a), (pb, b)| pb.cmp(pa).then_with(|| cmp_names(&a.name, &b.name)));
}

/// Case-insensitive name order, falling back to exact comparison
pub(crate) fn cmp_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()));
    folded.then_with(|| a.cmp(b))
}
