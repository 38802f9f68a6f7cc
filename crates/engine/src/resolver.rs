//! First-match-wins resolution over an ordered host list.
//!
//! Hosts arrive ordered highest precedence first (regions by priority, then
//! the world, then global). The first host that both defines the key and
//! whose target accepts the actor supplies the value. A rejecting target is
//! not "no opinion": resolution falls through to the next host. When no host
//! matches, the registry default applies.

use crate::host::Host;
use crate::setting::{SettingData, SettingKey, SettingType};
use crate::target::Subject;

/// Effective value plus the host that supplied it
#[derive(Debug, Clone)]
pub struct Resolution<T> {
    pub value: T,
    /// `None` when the registry default was used
    pub source: Option<Host>,
}

impl<T> Resolution<T> {
    pub fn is_default(&self) -> bool {
        self.source.is_none()
    }
}

/// Resolve a typed key over `hosts`
pub fn resolve<T: SettingType>(
    hosts: &[Host],
    key: &SettingKey<T>,
    actor: Option<&dyn Subject>,
) -> Resolution<T> {
    for host in hosts {
        let settings = host.settings();
        let Some(stored) = settings.get_raw(key.id()) else {
            continue;
        };
        if !stored.target.accepts(actor) {
            continue;
        }
        match T::from_data(&stored.data) {
            Some(value) => {
                return Resolution {
                    value,
                    source: Some(host.clone()),
                }
            }
            None => {
                // Values are kind-checked on write; only a registry/key mismatch gets here.
                log::debug!("{host}: stored '{}' does not match key type, skipping", key.id());
            }
        }
    }
    Resolution {
        value: key.default_value().clone(),
        source: None,
    }
}

/// Resolve an erased key over `hosts`, falling back to `default`
pub fn resolve_data(
    hosts: &[Host],
    id: &str,
    default: &SettingData,
    actor: Option<&dyn Subject>,
) -> (SettingData, Option<Host>) {
    for host in hosts {
        let settings = host.settings();
        if let Some(stored) = settings.get_raw(id) {
            if stored.target.accepts(actor) {
                return (stored.data.clone(), Some(host.clone()));
            }
        }
    }
    (default.clone(), None)
}

/// True if `host` defines `id` with the same value its parent chain would
/// resolve to for an anonymous lookup. Advisory only.
pub fn is_redundant(host: &Host, parents: &[Host], id: &str, default: &SettingData) -> bool {
    let Some(own) = host.get_raw(id) else {
        return false;
    };
    let (inherited, _) = resolve_data(parents, id, default, None);
    own.data == inherited
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use uuid::Uuid;

    use crate::flags;
    use crate::geometry::{Bounds, Vector3i, WorldId};
    use crate::host::GlobalHost;
    use crate::region::{Region, RegionId};
    use crate::settings_map::{SettingValue, SettingsMap};
    use crate::target::{Actor, TargetPredicate};

    fn region(id: u64, priority: i32) -> Host {
        let bounds = Bounds::new(Vector3i::new(0, 0, 0), Vector3i::new(9, 9, 9)).unwrap();
        Host::Region(Arc::new(Region::new(
            RegionId(id),
            format!("r{id}"),
            WorldId::from_u128(1),
            bounds,
            priority,
            SettingsMap::new(),
        )))
    }

    fn global() -> Host {
        Host::Global(Arc::new(GlobalHost::new()))
    }

    #[test]
    fn test_first_match_wins() {
        let high = region(1, 10);
        let low = region(2, 5);
        high.put(&flags::HEAL_AMOUNT, SettingValue::new(4)).unwrap();
        low.put(&flags::HEAL_AMOUNT, SettingValue::new(1)).unwrap();

        let hosts = vec![high.clone(), low];
        let res = resolve(&hosts, &flags::HEAL_AMOUNT, None);
        assert_eq!(res.value, 4);
        assert!(res.source.unwrap().same_as(&high));
    }

    #[test]
    fn test_rejecting_target_falls_through() {
        let outsider = Actor::new(Uuid::from_u128(9));
        let member = Uuid::from_u128(1);

        let zone = region(1, 10);
        let g = global();
        zone.put(
            &flags::BUILD,
            SettingValue::new(true).with_target(TargetPredicate::whitelist().with_actor(member)),
        )
        .unwrap();
        g.put(&flags::BUILD, SettingValue::new(false)).unwrap();

        let hosts = vec![zone, g.clone()];
        let res = resolve(&hosts, &flags::BUILD, Some(&outsider));
        assert!(!res.value);
        assert!(res.source.unwrap().same_as(&g));

        let insider = Actor::new(member);
        assert!(resolve(&hosts, &flags::BUILD, Some(&insider)).value);
    }

    #[test]
    fn test_default_when_undefined() {
        let hosts = vec![region(1, 0), global()];
        let res = resolve(&hosts, &flags::HEAL_DELAY, None);
        assert_eq!(res.value, 20);
        assert!(res.is_default());
    }

    #[test]
    fn test_is_redundant() {
        let zone = region(1, 0);
        let g = global();
        let default = flags::PVP.descriptor().default;

        // Same as the registry default
        zone.put(&flags::PVP, SettingValue::new(true)).unwrap();
        assert!(is_redundant(&zone, &[g.clone()], "pvp", &default));

        // Differs from what global resolves to
        g.put(&flags::PVP, SettingValue::new(false)).unwrap();
        assert!(!is_redundant(&zone, &[g.clone()], "pvp", &default));

        // Not set on the host at all
        assert!(!is_redundant(&zone, &[g], "build", &flags::BUILD.descriptor().default));
    }
}
