// Configuration loading

pub mod engine_config;

pub use engine_config::{CacheConfig, ConfigError, EngineConfig, LimitsConfig};
