//! Persistence boundary: settings assignments and whole-hierarchy snapshots.
//!
//! The engine does no file IO. Persistence code serializes a
//! `HierarchySnapshot` (or per-host assignment lists) in whatever format it
//! stores. Import is lenient: stale keys and unparsable values are reported
//! per entry and skipped, the rest of the batch is applied.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{SettingError, ZoneError};
use crate::geometry::{Bounds, WorldId};
use crate::hierarchy::HostHierarchy;
use crate::host::Host;
use crate::registry::SettingRegistry;
use crate::settings_map::SettingsMap;
use crate::target::{TargetDescriptor, TargetPredicate};

// ============================================================================
// Setting assignments
// ============================================================================

/// One persisted `(key, value, target)` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingAssignment {
    pub key: String,
    pub value: Json,
    #[serde(default, skip_serializing_if = "TargetDescriptor::is_everyone")]
    pub target: TargetDescriptor,
}

/// Result of `deserialize_assignments`
#[derive(Debug, Default)]
pub struct ImportedSettings {
    pub map: SettingsMap,
    pub problems: Vec<SettingError>,
}

/// Export a settings map, sorted by key
pub fn serialize_assignments(map: &SettingsMap) -> Vec<SettingAssignment> {
    map.entries()
        .into_iter()
        .map(|(id, stored)| SettingAssignment {
            key: id.to_string(),
            value: stored.data.to_json(),
            target: stored.target.to_descriptor(),
        })
        .collect()
}

/// Rebuild a settings map from persisted records.
///
/// Unknown keys are reported as `StaleKey` and values that do not fit their
/// key as `Parse`; both are logged and skipped without aborting the batch.
pub fn deserialize_assignments(
    registry: &SettingRegistry,
    records: &[SettingAssignment],
) -> ImportedSettings {
    let mut imported = ImportedSettings::default();
    for record in records {
        let Some(descriptor) = registry.get(&record.key) else {
            log::warn!("skipping stale setting '{}' (not registered)", record.key);
            imported.problems.push(SettingError::StaleKey(record.key.clone()));
            continue;
        };
        let target = TargetPredicate::from(record.target.clone());
        let stored = descriptor
            .parse_json(&record.value)
            .and_then(|data| imported.map.put_data(descriptor, data, target));
        if let Err(e) = stored {
            log::warn!("skipping setting: {e}");
            imported.problems.push(e);
        }
    }
    imported
}

// ============================================================================
// Hierarchy snapshots
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HierarchySnapshot {
    #[serde(default)]
    pub global: Vec<SettingAssignment>,
    #[serde(default)]
    pub worlds: Vec<WorldSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub id: WorldId,
    pub name: String,
    #[serde(default)]
    pub settings: Vec<SettingAssignment>,
    #[serde(default)]
    pub zones: Vec<ZoneSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub name: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub settings: Vec<SettingAssignment>,
}

/// Something that went wrong while importing a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportProblem {
    /// A setting entry on the named host was skipped
    Setting { host: String, error: SettingError },
    /// A zone could not be created
    Zone { name: String, error: ZoneError },
}

/// Summary of `import_snapshot`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub worlds: usize,
    pub zones: usize,
    pub settings: usize,
    pub problems: Vec<ImportProblem>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    /// Problems other than stale keys
    pub fn errors(&self) -> impl Iterator<Item = &ImportProblem> {
        self.problems.iter().filter(|p| match p {
            ImportProblem::Setting { error, .. } => !error.is_warning(),
            ImportProblem::Zone { .. } => true,
        })
    }
}

impl HostHierarchy {
    /// Deterministic copy of every host: worlds and zones by name, keys sorted
    pub fn export_snapshot(&self) -> HierarchySnapshot {
        let worlds = self
            .worlds()
            .into_iter()
            .map(|world| {
                let zones = self
                    .zones_in(world.id())
                    .iter()
                    .map(|zone| ZoneSnapshot {
                        name: zone.name().to_string(),
                        bounds: zone.bounds(),
                        priority: zone.priority(),
                        settings: serialize_assignments(&zone.settings()),
                    })
                    .collect();
                let settings = serialize_assignments(&world.settings());
                WorldSnapshot {
                    id: world.id(),
                    name: world.name().to_string(),
                    settings,
                    zones,
                }
            })
            .collect();
        HierarchySnapshot {
            global: serialize_assignments(&self.global().settings()),
            worlds,
        }
    }

    /// Merge a snapshot into this hierarchy.
    ///
    /// Worlds are registered if missing, settings are written over existing
    /// values, and zones are created. Failing entries are reported in the
    /// returned `ImportReport` and skipped.
    pub fn import_snapshot(&self, snapshot: &HierarchySnapshot) -> ImportReport {
        let mut report = ImportReport::default();

        self.import_settings(&self.global(), &snapshot.global, &mut report);

        for world_snap in &snapshot.worlds {
            let world = Host::World(self.add_world(world_snap.id, world_snap.name.clone()));
            report.worlds += 1;
            self.import_settings(&world, &world_snap.settings, &mut report);

            for zone_snap in &world_snap.zones {
                let settings = self.scoped_settings(&zone_snap.name, &zone_snap.settings, &mut report);
                let count = settings.len();
                match self.add_zone_with_settings(
                    &zone_snap.name,
                    world_snap.id,
                    zone_snap.bounds.min(),
                    zone_snap.bounds.max(),
                    zone_snap.priority,
                    settings,
                ) {
                    Ok(_) => {
                        report.zones += 1;
                        report.settings += count;
                    }
                    Err(error) => {
                        log::warn!("skipping zone '{}': {}", zone_snap.name, error);
                        report.problems.push(ImportProblem::Zone {
                            name: zone_snap.name.clone(),
                            error,
                        });
                    }
                }
            }
        }

        log::info!(
            "snapshot imported: {} worlds, {} zones, {} settings, {} problems",
            report.worlds,
            report.zones,
            report.settings,
            report.problems.len()
        );
        report
    }

    /// Import records for a non-global host, dropping global-only keys
    fn scoped_settings(
        &self,
        host_name: &str,
        records: &[SettingAssignment],
        report: &mut ImportReport,
    ) -> SettingsMap {
        let imported = deserialize_assignments(self.registry(), records);
        let mut map = imported.map;
        let mut problems = imported.problems;
        let global_only: Vec<&'static str> = map
            .entries()
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| self.registry().get(id).is_some_and(|d| d.meta.global_only))
            .collect();
        for id in global_only {
            map.remove_raw(id);
            log::warn!("skipping '{id}' on '{host_name}': global-only setting");
            problems.push(SettingError::GlobalOnly(id.to_string()));
        }
        report.problems.extend(problems.into_iter().map(|error| ImportProblem::Setting {
            host: host_name.to_string(),
            error,
        }));
        map
    }

    fn import_settings(&self, host: &Host, records: &[SettingAssignment], report: &mut ImportReport) {
        let map = match host {
            Host::Global(_) => {
                let imported = deserialize_assignments(self.registry(), records);
                report
                    .problems
                    .extend(imported.problems.into_iter().map(|error| ImportProblem::Setting {
                        host: host.name().to_string(),
                        error,
                    }));
                imported.map
            }
            _ => self.scoped_settings(host.name(), records, report),
        };
        for (id, stored) in map.entries() {
            let Some(descriptor) = self.registry().get(id) else {
                continue;
            };
            match host.put_data(descriptor, stored.data.clone(), stored.target.clone()) {
                Ok(_) => report.settings += 1,
                Err(error) => report.problems.push(ImportProblem::Setting {
                    host: host.name().to_string(),
                    error,
                }),
            }
        }
    }
}
