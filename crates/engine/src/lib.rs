//! `zoneguard-engine`: hierarchical spatial settings resolution.
//!
//! Global, world and region hosts carry typed settings. A lookup for
//! `(key, location, actor)` walks the regions containing the point by
//! priority, then the world, then global, and returns the first value whose
//! target accepts the actor, or the key's default.
//!
//! Pure engine crate: no file IO, no logger installed.

pub mod error;
pub mod flags;
pub mod geometry;
pub mod hierarchy;
pub mod host;
pub mod point_cache;
pub mod region;
pub mod registry;
pub mod resolver;
pub mod setting;
pub mod settings_map;
pub mod snapshot;
pub mod spatial_index;
pub mod target;

pub use error::{MoveError, RegistryError, SettingError, ZoneError};
pub use geometry::{Axis, Bounds, Location, Vector3i, WorldId};
pub use hierarchy::{HierarchyOptions, HostHierarchy};
pub use host::{Applicability, Host};
pub use region::{Region, RegionId, RegionSnapshot};
pub use registry::SettingRegistry;
pub use resolver::Resolution;
pub use setting::{SettingKey, SettingType};
pub use settings_map::{SettingValue, SettingsMap};
pub use snapshot::{HierarchySnapshot, ImportReport};
pub use target::{Actor, Subject, TargetPredicate};
