//! Settings hosts: the global scope, worlds and regions.
//!
//! Each scope owns a settings map behind its own lock. `Host` is the common
//! handle handed out by lookups and used by the command layer to edit
//! settings without caring which scope it is talking to.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::SettingError;
use crate::geometry::WorldId;
use crate::point_cache::CacheStats;
use crate::region::Region;
use crate::setting::{KeyDescriptor, SettingData, SettingKey, SettingType};
use crate::settings_map::{SettingValue, SettingsMap, StoredValue};
use crate::spatial_index::SpatialIndex;
use crate::target::TargetPredicate;

/// Scope at which a host applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Applicability {
    Global,
    World,
    Region,
}

impl fmt::Display for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::World => write!(f, "world"),
            Self::Region => write!(f, "region"),
        }
    }
}

// ============================================================================
// Concrete hosts
// ============================================================================

/// Process-wide settings. One per hierarchy.
#[derive(Debug, Default)]
pub struct GlobalHost {
    settings: RwLock<SettingsMap>,
}

impl GlobalHost {
    /// Display name used in diagnostics
    pub const NAME: &'static str = "__global__";

    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> RwLockReadGuard<'_, SettingsMap> {
        self.settings.read()
    }

    pub(crate) fn settings_mut(&self) -> RwLockWriteGuard<'_, SettingsMap> {
        self.settings.write()
    }
}

/// A world: its own settings plus the index of its regions
#[derive(Debug)]
pub struct WorldHost {
    id: WorldId,
    name: String,
    settings: RwLock<SettingsMap>,
    index: RwLock<SpatialIndex>,
}

impl WorldHost {
    pub(crate) fn new(id: WorldId, name: String, index: SpatialIndex) -> Self {
        Self {
            id,
            name,
            settings: RwLock::new(SettingsMap::new()),
            index: RwLock::new(index),
        }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> RwLockReadGuard<'_, SettingsMap> {
        self.settings.read()
    }

    pub(crate) fn settings_mut(&self) -> RwLockWriteGuard<'_, SettingsMap> {
        self.settings.write()
    }

    pub(crate) fn index(&self) -> RwLockReadGuard<'_, SpatialIndex> {
        self.index.read()
    }

    pub(crate) fn index_mut(&self) -> RwLockWriteGuard<'_, SpatialIndex> {
        self.index.write()
    }

    pub fn region_count(&self) -> usize {
        self.index.read().len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.index.read().cache_stats()
    }
}

// ============================================================================
// Host handle
// ============================================================================

/// Handle to any settings scope
#[derive(Debug, Clone)]
pub enum Host {
    Global(Arc<GlobalHost>),
    World(Arc<WorldHost>),
    Region(Arc<Region>),
}

impl Host {
    pub fn applicability(&self) -> Applicability {
        match self {
            Self::Global(_) => Applicability::Global,
            Self::World(_) => Applicability::World,
            Self::Region(_) => Applicability::Region,
        }
    }

    /// Region priority. Worlds and the global scope rank below every region
    /// and have none.
    pub fn priority(&self) -> Option<i32> {
        match self {
            Self::Region(r) => Some(r.priority()),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Global(_) => GlobalHost::NAME,
            Self::World(w) => w.name(),
            Self::Region(r) => r.name(),
        }
    }

    pub fn as_region(&self) -> Option<&Arc<Region>> {
        match self {
            Self::Region(r) => Some(r),
            _ => None,
        }
    }

    /// True if both handles point at the same host
    pub fn same_as(&self, other: &Host) -> bool {
        match (self, other) {
            (Self::Global(a), Self::Global(b)) => Arc::ptr_eq(a, b),
            (Self::World(a), Self::World(b)) => Arc::ptr_eq(a, b),
            (Self::Region(a), Self::Region(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn settings(&self) -> RwLockReadGuard<'_, SettingsMap> {
        match self {
            Self::Global(g) => g.settings(),
            Self::World(w) => w.settings(),
            Self::Region(r) => r.settings(),
        }
    }

    fn settings_mut(&self) -> RwLockWriteGuard<'_, SettingsMap> {
        match self {
            Self::Global(g) => g.settings_mut(),
            Self::World(w) => w.settings_mut(),
            Self::Region(r) => r.settings_mut(),
        }
    }

    fn check_scope(&self, descriptor_id: &str, global_only: bool) -> Result<(), SettingError> {
        if global_only && self.applicability() != Applicability::Global {
            return Err(SettingError::GlobalOnly(descriptor_id.to_string()));
        }
        Ok(())
    }

    pub fn get<T: SettingType>(&self, key: &SettingKey<T>) -> Option<SettingValue<T>> {
        self.settings().get(key)
    }

    pub fn get_raw(&self, id: &str) -> Option<StoredValue> {
        self.settings().get_raw(id).cloned()
    }

    /// Set a value, returning the previous one. Global-only keys are
    /// rejected on worlds and regions.
    pub fn put<T: SettingType>(
        &self,
        key: &SettingKey<T>,
        value: SettingValue<T>,
    ) -> Result<Option<SettingValue<T>>, SettingError> {
        self.check_scope(key.id(), key.meta().global_only)?;
        Ok(self.settings_mut().put(key, value))
    }

    pub fn put_data(
        &self,
        descriptor: &KeyDescriptor,
        data: SettingData,
        target: TargetPredicate,
    ) -> Result<Option<StoredValue>, SettingError> {
        self.check_scope(descriptor.id, descriptor.meta.global_only)?;
        self.settings_mut().put_data(descriptor, data, target)
    }

    /// Parse command input and set it
    pub fn put_raw(
        &self,
        descriptor: &KeyDescriptor,
        raw: &str,
        target: TargetPredicate,
    ) -> Result<Option<StoredValue>, SettingError> {
        let data = descriptor.parse(raw)?;
        self.put_data(descriptor, data, target)
    }

    pub fn remove<T: SettingType>(&self, key: &SettingKey<T>) -> Option<SettingValue<T>> {
        self.settings_mut().remove(key)
    }

    pub fn remove_raw(&self, id: &str) -> Option<StoredValue> {
        self.settings_mut().remove_raw(id)
    }

    /// Edit the target of an existing value in place.
    /// Returns `None` if the key is not set here.
    pub fn update_target<R>(&self, id: &str, f: impl FnOnce(&mut TargetPredicate) -> R) -> Option<R> {
        let mut settings = self.settings_mut();
        settings.target_mut(id).map(f)
    }

    /// All entries, sorted by key id
    pub fn entries(&self) -> Vec<(&'static str, StoredValue)> {
        self.settings()
            .entries()
            .into_iter()
            .map(|(id, v)| (id, v.clone()))
            .collect()
    }

    /// Copy of the whole settings map
    pub fn get_all(&self) -> SettingsMap {
        self.settings().clone()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.applicability(), self.name())
    }
}
