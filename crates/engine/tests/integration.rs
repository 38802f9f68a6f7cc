use std::sync::Arc;

use uuid::Uuid;

use zoneguard_engine::flags;
use zoneguard_engine::{
    Actor, Applicability, HierarchyOptions, Host, HostHierarchy, Location, Region,
    SettingRegistry, SettingValue, TargetPredicate, Vector3i, WorldId, ZoneError,
};

fn v(x: i32, y: i32, z: i32) -> Vector3i {
    Vector3i::new(x, y, z)
}

fn overworld() -> WorldId {
    WorldId::from_u128(1)
}

fn hierarchy() -> HostHierarchy {
    let h = HostHierarchy::with_builtin_flags();
    h.add_world(overworld(), "overworld");
    h
}

/// Hierarchy whose worlds always go through the point cache.
fn cached_hierarchy() -> HostHierarchy {
    let options = HierarchyOptions {
        cache_min_regions: 0,
        ..HierarchyOptions::default()
    };
    let h = HostHierarchy::new(SettingRegistry::builtin(), options);
    h.add_world(overworld(), "overworld");
    h
}

fn at(x: i32, y: i32, z: i32) -> Location {
    Location::new(overworld(), x, y, z)
}

fn region_host(zone: &Arc<Region>) -> Host {
    Host::Region(Arc::clone(zone))
}

// -------------------------------------------------------------------------
// Resolution scenarios
// -------------------------------------------------------------------------

#[test]
fn spawn_and_arena() {
    let h = hierarchy();
    let spawn = h.add_zone("spawn", overworld(), v(0, 0, 0), v(10, 10, 10), 0).unwrap();
    let arena = h.add_zone("arena", overworld(), v(2, 2, 2), v(4, 4, 4), 5).unwrap();
    region_host(&spawn).put(&flags::PVP, SettingValue::new(false)).unwrap();
    region_host(&arena).put(&flags::PVP, SettingValue::new(true)).unwrap();

    let anyone = Actor::new(Uuid::from_u128(77));
    for actor in [None, Some(&anyone as &dyn zoneguard_engine::Subject)] {
        assert!(h.lookup(&flags::PVP, at(3, 3, 3), actor));
        assert!(!h.lookup(&flags::PVP, at(1, 1, 1), actor));
        assert!(h.lookup(&flags::PVP, at(20, 20, 20), actor));
    }

    let res = h.resolve(&flags::PVP, at(20, 20, 20), None);
    assert!(res.is_default());
    let res = h.resolve(&flags::PVP, at(3, 3, 3), None);
    assert_eq!(res.source.unwrap().name(), "arena");
}

#[test]
fn higher_priority_wins() {
    let h = hierarchy();
    let a = h.add_zone("a", overworld(), v(0, 0, 0), v(10, 10, 10), 10).unwrap();
    let b = h.add_zone("b", overworld(), v(0, 0, 0), v(10, 10, 10), 5).unwrap();
    region_host(&a).put(&flags::HEAL_AMOUNT, SettingValue::new(6)).unwrap();
    region_host(&b).put(&flags::HEAL_AMOUNT, SettingValue::new(2)).unwrap();

    assert_eq!(h.lookup(&flags::HEAL_AMOUNT, at(5, 5, 5), None), 6);

    // Lower-priority zone is consulted once the higher one stops defining the key
    region_host(&a).remove(&flags::HEAL_AMOUNT);
    assert_eq!(h.lookup(&flags::HEAL_AMOUNT, at(5, 5, 5), None), 2);
}

#[test]
fn equal_priority_breaks_ties_by_name() {
    let h = hierarchy();
    let zulu = h.add_zone("zulu", overworld(), v(0, 0, 0), v(10, 10, 10), 1).unwrap();
    let alpha = h.add_zone("Alpha", overworld(), v(0, 0, 0), v(10, 10, 10), 1).unwrap();
    region_host(&zulu).put(&flags::HEAL_DELAY, SettingValue::new(1)).unwrap();
    region_host(&alpha).put(&flags::HEAL_DELAY, SettingValue::new(2)).unwrap();

    for _ in 0..3 {
        assert_eq!(h.lookup(&flags::HEAL_DELAY, at(5, 5, 5), None), 2);
    }
}

#[test]
fn rejected_target_falls_through_to_world() {
    let h = hierarchy();
    let member = Uuid::from_u128(1);
    let outsider = Actor::new(Uuid::from_u128(2));

    let zone = h.add_zone("base", overworld(), v(0, 0, 0), v(10, 10, 10), 10).unwrap();
    region_host(&zone)
        .put(
            &flags::BUILD,
            SettingValue::new(true).with_target(TargetPredicate::whitelist().with_actor(member)),
        )
        .unwrap();
    let world = Host::World(h.world(overworld()).unwrap());
    world.put(&flags::BUILD, SettingValue::new(false)).unwrap();

    assert!(!h.lookup(&flags::BUILD, at(5, 5, 5), Some(&outsider)));
    assert!(h.lookup(&flags::BUILD, at(5, 5, 5), Some(&Actor::new(member))));

    let res = h.resolve(&flags::BUILD, at(5, 5, 5), Some(&outsider));
    assert_eq!(res.source.unwrap().applicability(), Applicability::World);
}

#[test]
fn blacklisted_permission_holder_falls_through() {
    let h = hierarchy();
    let zone = h.add_zone("shop", overworld(), v(0, 0, 0), v(10, 10, 10), 0).unwrap();
    region_host(&zone)
        .put(
            &flags::ENTRY,
            SettingValue::new(false).with_target(TargetPredicate::blacklist().with_permission("zone.vip")),
        )
        .unwrap();

    let vip = Actor::new(Uuid::from_u128(3)).with_permission("zone.vip");
    let regular = Actor::new(Uuid::from_u128(4));
    assert!(h.lookup(&flags::ENTRY, at(1, 1, 1), Some(&vip)));
    assert!(!h.lookup(&flags::ENTRY, at(1, 1, 1), Some(&regular)));
    assert!(!h.lookup(&flags::ENTRY, at(1, 1, 1), None));
}

#[test]
fn anonymous_skips_actor_only_blacklist() {
    let h = hierarchy();
    let zone = h.add_zone("pit", overworld(), v(0, 0, 0), v(10, 10, 10), 0).unwrap();
    region_host(&zone)
        .put(
            &flags::FALL_DAMAGE,
            SettingValue::new(false).with_target(TargetPredicate::blacklist().with_actor(Uuid::from_u128(5))),
        )
        .unwrap();
    assert!(h.lookup(&flags::FALL_DAMAGE, at(1, 1, 1), None));
    assert!(!h.lookup(&flags::FALL_DAMAGE, at(1, 1, 1), Some(&Actor::new(Uuid::from_u128(6)))));
}

#[test]
fn global_then_default() {
    let h = hierarchy();
    assert_eq!(h.lookup(&flags::HEAL_DELAY, at(0, 0, 0), None), 20);

    h.global().put(&flags::HEAL_DELAY, SettingValue::new(40)).unwrap();
    assert_eq!(h.lookup(&flags::HEAL_DELAY, at(0, 0, 0), None), 40);

    // Unknown worlds still see global values
    let elsewhere = Location::new(WorldId::from_u128(404), 0, 0, 0);
    assert_eq!(h.lookup(&flags::HEAL_DELAY, elsewhere, None), 40);
}

#[test]
fn unbounded_axis_zone() {
    let h = hierarchy();
    let column = h
        .add_zone(
            "column",
            overworld(),
            v(0, i32::MIN, 0),
            v(4, i32::MAX, 4),
            0,
        )
        .unwrap();
    region_host(&column).put(&flags::MOB_SPAWN, SettingValue::new(false)).unwrap();

    assert!(!h.lookup(&flags::MOB_SPAWN, at(2, -64, 2), None));
    assert!(!h.lookup(&flags::MOB_SPAWN, at(2, i32::MAX, 2), None));
    assert!(h.lookup(&flags::MOB_SPAWN, at(5, 0, 2), None));
}

// -------------------------------------------------------------------------
// Structural changes and the cache
// -------------------------------------------------------------------------

#[test]
fn remove_is_idempotent() {
    let h = hierarchy();
    h.add_zone("spawn", overworld(), v(0, 0, 0), v(10, 10, 10), 0).unwrap();
    h.add_zone("other", overworld(), v(50, 0, 0), v(60, 10, 10), 0).unwrap();

    assert!(h.remove_zone("spawn").is_ok());
    let before = h.export_snapshot();
    assert_eq!(h.remove_zone("spawn").unwrap_err(), ZoneError::NotFound("spawn".into()));
    assert_eq!(h.export_snapshot(), before);
    assert_eq!(h.zone_count(), 1);
}

#[test]
fn add_and_remove_keep_cache_correct() {
    let h = cached_hierarchy();
    let p = at(3, 3, 3);
    assert_eq!(h.containing_hosts(p).len(), 2);

    let zone = h.add_zone("late", overworld(), v(0, 0, 0), v(5, 5, 5), 0).unwrap();
    region_host(&zone).put(&flags::PVP, SettingValue::new(false)).unwrap();
    assert!(!h.lookup(&flags::PVP, p, None));

    h.remove_zone("late").unwrap();
    assert!(h.lookup(&flags::PVP, p, None));
    assert_eq!(h.containing_hosts(p).len(), 2);

    let stats = h.cache_stats(overworld()).unwrap();
    assert!(stats.invalidations >= 2);
}

#[test]
fn setting_change_does_not_invalidate_cache() {
    let h = cached_hierarchy();
    let zone = h.add_zone("spawn", overworld(), v(0, 0, 0), v(10, 10, 10), 0).unwrap();
    h.lookup(&flags::PVP, at(1, 1, 1), None);

    region_host(&zone).put(&flags::PVP, SettingValue::new(false)).unwrap();
    assert!(!h.lookup(&flags::PVP, at(1, 1, 1), None));

    let stats = h.cache_stats(overworld()).unwrap();
    assert_eq!(stats.invalidations, 0);
    assert_eq!(stats.hits, 1);
}

#[test]
fn move_zone_round_trip() {
    let h = cached_hierarchy();
    let zone = h.add_zone("spawn", overworld(), v(0, 0, 0), v(10, 10, 10), 4).unwrap();
    region_host(&zone).put(&flags::PVP, SettingValue::new(false)).unwrap();
    assert!(!h.lookup(&flags::PVP, at(5, 5, 5), None));

    h.move_zone("spawn", overworld(), v(20, 0, 20), v(30, 10, 30)).unwrap();
    assert!(h.lookup(&flags::PVP, at(5, 5, 5), None));
    assert!(!h.lookup(&flags::PVP, at(25, 5, 25), None));
    assert_eq!(h.zone("SPAWN").unwrap().priority(), 4);
}

#[test]
fn moving_between_worlds() {
    let h = hierarchy();
    let nether = WorldId::from_u128(2);
    h.add_world(nether, "nether");
    h.add_zone("portal", overworld(), v(0, 0, 0), v(3, 3, 3), 0).unwrap();

    let moved = h.move_zone("portal", nether, v(0, 0, 0), v(3, 3, 3)).unwrap();
    assert_eq!(moved.world(), nether);
    assert!(h.zones_in(overworld()).is_empty());
    assert_eq!(h.zones_in(nether).len(), 1);
}

#[test]
fn global_only_key_stays_global() {
    let h = hierarchy();
    let zone = h.add_zone("spawn", overworld(), v(0, 0, 0), v(10, 10, 10), 0).unwrap();

    let err = region_host(&zone)
        .put(&flags::MAX_ZONES_PER_PLAYER, SettingValue::new(99))
        .unwrap_err();
    assert!(matches!(err, zoneguard_engine::SettingError::GlobalOnly(_)));
    h.global()
        .put(&flags::MAX_ZONES_PER_PLAYER, SettingValue::new(7))
        .unwrap();
    assert_eq!(h.lookup(&flags::MAX_ZONES_PER_PLAYER, at(1, 1, 1), None), 7);

    // Seeding a zone cannot smuggle the key in either
    let mut seeded = zoneguard_engine::SettingsMap::new();
    seeded.put(&flags::MAX_ZONES_PER_PLAYER, SettingValue::new(99));
    let err = h
        .add_zone_with_settings("seeded", overworld(), v(0, 0, 0), v(1, 1, 1), 0, seeded)
        .unwrap_err();
    assert!(matches!(err, ZoneError::GlobalOnlySetting { ref key, .. } if key == "max-zones-per-player"));

    // The export holds the key only at global scope and re-imports cleanly
    let snapshot = h.export_snapshot();
    assert!(snapshot.worlds[0].zones[0].settings.is_empty());
    let copy = HostHierarchy::with_builtin_flags();
    let report = copy.import_snapshot(&snapshot);
    assert!(report.is_clean(), "{:?}", report.problems);
    assert_eq!(copy.lookup(&flags::MAX_ZONES_PER_PLAYER, at(1, 1, 1), None), 7);
}

// -------------------------------------------------------------------------
// Redundancy
// -------------------------------------------------------------------------

#[test]
fn redundancy_against_parent_chain() {
    let h = hierarchy();
    let zone = h.add_zone("spawn", overworld(), v(0, 0, 0), v(10, 10, 10), 0).unwrap();
    let region = Host::Region(Arc::clone(&zone));
    let world = Host::World(h.world(overworld()).unwrap());

    // Equal to the registry default
    region.put(&flags::PVP, SettingValue::new(true)).unwrap();
    assert!(h.is_redundant(&region, &flags::PVP));

    // World now disagrees, so the zone's value matters
    world.put(&flags::PVP, SettingValue::new(false)).unwrap();
    assert!(!h.is_redundant(&region, &flags::PVP));
    assert!(!h.is_redundant(&world, &flags::PVP));

    // Global agrees with world
    h.global().put(&flags::PVP, SettingValue::new(false)).unwrap();
    assert!(h.is_redundant(&world, &flags::PVP));
    assert!(h.is_redundant_raw(&world, "pvp"));

    // Redundancy is advisory: lookups still use the zone value
    assert!(h.lookup(&flags::PVP, at(1, 1, 1), None));
    assert!(!h.is_redundant(&h.global(), &flags::HEAL_DELAY));
}

#[test]
fn containing_hosts_cached_matches_uncached() {
    let h = cached_hierarchy();
    h.add_zone("a", overworld(), v(0, 0, 0), v(10, 10, 10), 0).unwrap();
    h.add_zone("b", overworld(), v(5, 5, 5), v(15, 15, 15), 3).unwrap();
    h.add_zone("c", overworld(), v(-5, -5, -5), v(6, 6, 6), 3).unwrap();

    for x in -6..17 {
        let p = at(x, 6, 6);
        let cached: Vec<String> = h.containing_hosts(p).iter().map(|h| h.name().to_string()).collect();
        let again: Vec<String> = h.containing_hosts(p).iter().map(|h| h.name().to_string()).collect();
        let fresh: Vec<String> = h
            .containing_hosts_uncached(p)
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(cached, fresh, "at x = {x}");
        assert_eq!(again, fresh, "at x = {x}");
    }
}
