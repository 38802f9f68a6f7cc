// Engine settings
// Loaded from ~/.config/zoneguard/engine.toml

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use zoneguard_engine::hierarchy::{
    DEFAULT_CACHE_MIN_REGIONS, DEFAULT_CACHE_SIZE, DEFAULT_MAX_REGIONS,
};
use zoneguard_engine::{HierarchyOptions, WorldId};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Point cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cached points per world (0 disables the cache)
    pub size: usize,

    /// Worlds with fewer zones than this scan directly
    pub min_regions: usize,

    /// Per-world size overrides, keyed by world uuid
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub worlds: BTreeMap<String, usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CACHE_SIZE,
            min_regions: DEFAULT_CACHE_MIN_REGIONS,
            worlds: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of zones across all worlds
    pub max_regions: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_regions: DEFAULT_MAX_REGIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub limits: LimitsConfig,
}

impl EngineConfig {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zoneguard");
        config_dir.join("engine.toml")
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from the default location, falling back to defaults.
    ///
    /// A missing file is created with commented defaults. An unreadable or
    /// invalid file is logged and ignored.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let config = Self::default();
            config.create_default_file(&path);
            return config;
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}: {}; using default engine settings", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save to `path` (atomic write)
    ///
    /// Writes a temp file next to the target and renames it over.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = path.with_extension("toml.tmp");
        fs::write(&temp, self.to_toml()?)?;
        fs::rename(&temp, path)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_regions == 0 {
            return Err(ConfigError::Validation(
                "limits.max_regions must be at least 1".into(),
            ));
        }
        for key in self.cache.worlds.keys() {
            if Uuid::parse_str(key).is_err() {
                return Err(ConfigError::Validation(format!(
                    "cache.worlds: '{}' is not a world uuid",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Engine options described by this config
    pub fn hierarchy_options(&self) -> Result<HierarchyOptions, ConfigError> {
        self.validate()?;
        let mut world_cache_sizes = HashMap::new();
        for (key, size) in &self.cache.worlds {
            let id = Uuid::parse_str(key).map_err(|e| ConfigError::Validation(e.to_string()))?;
            world_cache_sizes.insert(WorldId(id), *size);
        }
        Ok(HierarchyOptions {
            cache_size: self.cache.size,
            cache_min_regions: self.cache.min_regions,
            max_regions: self.limits.max_regions,
            world_cache_sizes,
        })
    }

    /// Create default config file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
            log::warn!("Error writing default engine.toml: {}", e);
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# ZoneGuard engine settings

[cache]
# Cached points per world; 0 disables the cache
size = 4096
# Worlds with fewer zones than this skip the cache
min_regions = 16

# Per-world cache size, keyed by world uuid
# [cache.worlds]
# "6f9619ff-8b86-d011-b42d-00cf4fc964ff" = 16384

[limits]
# Maximum number of zones across all worlds
max_regions = 100000
"#;
