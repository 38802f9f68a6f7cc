//! Error types for zone and setting operations.
//!
//! Structural errors are returned to the immediate caller (usually the command
//! layer) for user-facing messaging. Lookups never produce an error.

use std::fmt;

use crate::geometry::{Vector3i, WorldId};

/// Errors from structural zone mutations (add, remove, move)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// Zone name is empty or contains characters other than `[A-Za-z0-9_-]`
    InvalidName(String),
    /// Zone name is already in use somewhere in the process
    DuplicateName(String),
    /// `min` is greater than `max` on at least one axis
    InvalidBounds { min: Vector3i, max: Vector3i },
    /// The process-wide region limit has been reached
    CapacityExceeded { limit: usize },
    /// No zone with this name exists
    NotFound(String),
    /// The target world has not been registered with the hierarchy
    WorldNotFound(WorldId),
    /// Seed settings for a zone carry a key that may only be set globally
    GlobalOnlySetting { zone: String, key: String },
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) => write!(
                f,
                "'{name}' is not a valid zone name (use letters, digits, '_' and '-')"
            ),
            Self::DuplicateName(name) => write!(f, "a zone named '{name}' already exists"),
            Self::InvalidBounds { min, max } => {
                write!(f, "invalid bounds: min {min} exceeds max {max}")
            }
            Self::CapacityExceeded { limit } => {
                write!(f, "zone limit reached ({limit} zones)")
            }
            Self::NotFound(name) => write!(f, "no zone named '{name}'"),
            Self::WorldNotFound(world) => write!(f, "unknown world {world}"),
            Self::GlobalOnlySetting { zone, key } => {
                write!(f, "zone '{zone}': setting '{key}' can only be set globally")
            }
        }
    }
}

impl std::error::Error for ZoneError {}

/// Errors from setting values: parsing, import and scope checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    /// A raw string or persisted JSON value could not be converted to the key's type
    Parse {
        key: String,
        input: String,
        reason: String,
    },
    /// A persisted setting id no longer exists in the registry. Non-fatal.
    StaleKey(String),
    /// The key may only be set on the global host
    GlobalOnly(String),
    /// The stored value does not match the key's declared type
    TypeMismatch { key: String, expected: String },
}

impl SettingError {
    /// True for problems that should only warn (entry skipped, batch continues)
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::StaleKey(_))
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { key, input, reason } => {
                write!(f, "setting '{key}': cannot parse '{input}': {reason}")
            }
            Self::StaleKey(key) => write!(f, "unknown setting '{key}' (removed or renamed?)"),
            Self::GlobalOnly(key) => write!(f, "setting '{key}' can only be set globally"),
            Self::TypeMismatch { key, expected } => {
                write!(f, "setting '{key}': expected a {expected} value")
            }
        }
    }
}

impl std::error::Error for SettingError {}

/// Failure of the two-phase move (remove, then re-add)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The new placement was rejected; the original zone has been restored
    Rejected(ZoneError),
    /// The new placement was rejected and restoring the original also failed.
    /// The zone no longer exists.
    ZoneLost { cause: ZoneError, restore: ZoneError },
}

impl MoveError {
    /// The error that caused the move to fail
    pub fn cause(&self) -> &ZoneError {
        match self {
            Self::Rejected(cause) => cause,
            Self::ZoneLost { cause, .. } => cause,
        }
    }
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(cause) => write!(f, "move rejected: {cause}"),
            Self::ZoneLost { cause, restore } => write!(
                f,
                "move rejected ({cause}) and the original zone could not be restored ({restore}); the zone was lost"
            ),
        }
    }
}

impl std::error::Error for MoveError {}

/// Registry construction errors. These are programmer errors surfaced at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateKey(String),
    InvalidId(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey(id) => write!(f, "setting key '{id}' registered twice"),
            Self::InvalidId(id) => write!(f, "'{id}' is not a valid setting id"),
        }
    }
}

impl std::error::Error for RegistryError {}
