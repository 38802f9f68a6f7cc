//! Built-in setting keys.
//!
//! Every key is defined here, once, with its default and metadata. The
//! registry is built from `all()`; there is no distributed registration.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;

use crate::geometry::Vector3i;
use crate::setting::{Category, KeyDescriptor, SettingKey, SettingMeta, Text};

crate::setting_enum! {
    /// Game mode forced on players inside a zone
    pub enum GameMode {
        Survival => "survival",
        Creative => "creative",
        Adventure => "adventure",
        Spectator => "spectator",
    }
}

crate::setting_enum! {
    /// Client-side weather shown inside a zone
    pub enum Weather {
        Clear => "clear",
        Rain => "rain",
        Thunder => "thunder",
    }
}

macro_rules! flag {
    ($name:ident: $ty:ty = $id:literal, $default:expr, $meta:expr) => {
        pub static $name: Lazy<SettingKey<$ty>> = Lazy::new(|| SettingKey::new($id, $default, $meta));
    };
}

// Building
flag!(BUILD: bool = "build", true,
    SettingMeta::new(Category::Building).player_restrictive().describe("Break and place blocks"));
flag!(BLOCK_BREAK: bool = "block-break", true,
    SettingMeta::new(Category::Building).player_restrictive().describe("Break blocks"));
flag!(BLOCK_PLACE: bool = "block-place", true,
    SettingMeta::new(Category::Building).player_restrictive().describe("Place blocks"));
flag!(INTERACT: bool = "interact", true,
    SettingMeta::new(Category::Building).player_restrictive().describe("Use doors, buttons and containers"));

// Combat
flag!(PVP: bool = "pvp", true,
    SettingMeta::new(Category::Combat).player_restrictive().describe("Players may damage each other"));
flag!(DAMAGE_ANIMALS: bool = "damage-animals", true,
    SettingMeta::new(Category::Combat).player_restrictive().describe("Players may hurt passive mobs"));
flag!(FALL_DAMAGE: bool = "fall-damage", true,
    SettingMeta::new(Category::Combat).describe("Entities take fall damage"));

// Movement
flag!(ENTRY: bool = "entry", true,
    SettingMeta::new(Category::Movement).player_restrictive().describe("Players may enter"));
flag!(EXIT: bool = "exit", true,
    SettingMeta::new(Category::Movement).player_restrictive().describe("Players may leave"));
flag!(SPAWN_POINT: Vector3i = "spawn-point", Vector3i::new(0, 64, 0),
    SettingMeta::new(Category::Movement).describe("Respawn position"));

// Environment
flag!(EXPLOSION: bool = "explosion", true,
    SettingMeta::new(Category::Environment).describe("Explosions destroy blocks"));
flag!(FIRE_SPREAD: bool = "fire-spread", true,
    SettingMeta::new(Category::Environment).describe("Fire spreads to nearby blocks"));
flag!(WEATHER: Weather = "weather", Weather::Clear,
    SettingMeta::new(Category::Environment).describe("Client-side weather"));

// Entities
flag!(MOB_SPAWN: bool = "mob-spawn", true,
    SettingMeta::new(Category::Entities).describe("Hostile mobs spawn naturally"));
flag!(HUNGER: bool = "hunger", true,
    SettingMeta::new(Category::Entities).describe("Players lose food points"));
flag!(GAME_MODE: GameMode = "game-mode", GameMode::Survival,
    SettingMeta::new(Category::Entities).player_restrictive().describe("Forced game mode"));
flag!(HEAL_AMOUNT: i64 = "heal-amount", 0,
    SettingMeta::new(Category::Entities).describe("Half-hearts restored per heal tick"));
flag!(HEAL_DELAY: i64 = "heal-delay", 20,
    SettingMeta::new(Category::Entities).describe("Ticks between heals"));

// Items
flag!(ITEM_DROP: bool = "item-drop", true,
    SettingMeta::new(Category::Items).player_restrictive().describe("Players may drop items"));
flag!(ITEM_PICKUP: bool = "item-pickup", true,
    SettingMeta::new(Category::Items).player_restrictive().describe("Players may pick items up"));
flag!(BLOCKED_COMMANDS: BTreeSet<String> = "blocked-commands", BTreeSet::new(),
    SettingMeta::new(Category::Items).player_restrictive().describe("Commands that cannot be run"));

// Messages
flag!(GREETING: Text = "greeting", Text::default(),
    SettingMeta::new(Category::Messages).describe("Shown on entry"));
flag!(FAREWELL: Text = "farewell", Text::default(),
    SettingMeta::new(Category::Messages).describe("Shown on exit"));

// Admin
flag!(MAX_ZONES_PER_PLAYER: i64 = "max-zones-per-player", 3,
    SettingMeta::new(Category::Admin).global_only().describe("Zones a player may own"));

/// Descriptors of every built-in key
pub fn all() -> Vec<KeyDescriptor> {
    vec![
        BUILD.descriptor(),
        BLOCK_BREAK.descriptor(),
        BLOCK_PLACE.descriptor(),
        INTERACT.descriptor(),
        PVP.descriptor(),
        DAMAGE_ANIMALS.descriptor(),
        FALL_DAMAGE.descriptor(),
        ENTRY.descriptor(),
        EXIT.descriptor(),
        SPAWN_POINT.descriptor(),
        EXPLOSION.descriptor(),
        FIRE_SPREAD.descriptor(),
        WEATHER.descriptor(),
        MOB_SPAWN.descriptor(),
        HUNGER.descriptor(),
        GAME_MODE.descriptor(),
        HEAL_AMOUNT.descriptor(),
        HEAL_DELAY.descriptor(),
        ITEM_DROP.descriptor(),
        ITEM_PICKUP.descriptor(),
        BLOCKED_COMMANDS.descriptor(),
        GREETING.descriptor(),
        FAREWELL.descriptor(),
        MAX_ZONES_PER_PLAYER.descriptor(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::{SettingData, SettingType, ValueKind};

    #[test]
    fn test_pvp_defaults_to_allowed() {
        assert!(*PVP.default_value());
        assert!(PVP.meta().player_restrictive);
    }

    #[test]
    fn test_all_ids_unique() {
        let mut ids: Vec<&str> = all().iter().map(|d| d.id).collect();
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_enum_flag_kind() {
        assert_eq!(GAME_MODE.descriptor().kind, ValueKind::Enum(GameMode::NAMES));
        assert_eq!(GameMode::Creative.to_data(), SettingData::Enum("creative"));
        assert_eq!(Weather::from_name("THUNDER"), Some(Weather::Thunder));
    }

    #[test]
    fn test_global_only_flag() {
        assert!(MAX_ZONES_PER_PLAYER.meta().global_only);
        assert!(all().iter().filter(|d| d.meta.global_only).count() == 1);
    }
}
