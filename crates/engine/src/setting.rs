//! Setting keys, value types and the erased value representation.
//!
//! A `SettingKey<T>` is the typed handle used by callers. Hosts store values
//! erased as `SettingData`, which is totally ordered so sets and equality
//! checks (redundancy, no-op detection) need no per-type code.
//!
//! # Value kinds
//!
//! | kind      | Rust type          | raw input example       | JSON            |
//! |-----------|--------------------|-------------------------|-----------------|
//! | Boolean   | `bool`             | `allow`, `deny`, `true` | `true`          |
//! | Integer   | `i64`              | `-4`                    | `-4`            |
//! | Enum      | `setting_enum!`    | `creative`              | `"creative"`    |
//! | String    | `String`           | `spawn`                 | `"spawn"`       |
//! | Text      | `Text`             | `&aWelcome!`            | `"&aWelcome!"`  |
//! | Vector    | `Vector3i`         | `10,64,-3`              | `[10,64,-3]`    |
//! | Set       | `BTreeSet<T>`      | `home,tpa`              | `["home","tpa"]`|

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::SettingError;
use crate::geometry::Vector3i;

// ============================================================================
// Value kinds and erased data
// ============================================================================

/// Value-type tag of a setting key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    /// Closed set of lowercase variant names
    Enum(&'static [&'static str]),
    String,
    Text,
    Vector,
    Set(Box<ValueKind>),
}

impl ValueKind {
    /// Human-readable type name for messages
    pub fn name(&self) -> String {
        match self {
            Self::Boolean => "boolean".into(),
            Self::Integer => "integer".into(),
            Self::Enum(names) => format!("one of [{}]", names.join(", ")),
            Self::String => "string".into(),
            Self::Text => "text".into(),
            Self::Vector => "vector".into(),
            Self::Set(inner) => format!("set of {}", inner.name()),
        }
    }

    /// True if `data` is a value of this kind
    pub fn matches(&self, data: &SettingData) -> bool {
        match (self, data) {
            (Self::Boolean, SettingData::Bool(_)) => true,
            (Self::Integer, SettingData::Int(_)) => true,
            (Self::Enum(names), SettingData::Enum(n)) => names.contains(n),
            (Self::String, SettingData::Str(_)) => true,
            (Self::Text, SettingData::Text(_)) => true,
            (Self::Vector, SettingData::Vector(_)) => true,
            (Self::Set(inner), SettingData::Set(items)) => items.iter().all(|i| inner.matches(i)),
            _ => false,
        }
    }

    /// Parse user input (command arguments) into a value of this kind
    pub fn parse_raw(&self, raw: &str) -> Result<SettingData, String> {
        let trimmed = raw.trim();
        match self {
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "allow" | "yes" | "on" => Ok(SettingData::Bool(true)),
                "false" | "deny" | "no" | "off" => Ok(SettingData::Bool(false)),
                _ => Err("expected allow/deny or true/false".into()),
            },
            Self::Integer => trimmed
                .parse::<i64>()
                .map(SettingData::Int)
                .map_err(|_| "expected a whole number".into()),
            Self::Enum(names) => find_variant(names, trimmed)
                .map(SettingData::Enum)
                .ok_or_else(|| format!("expected one of [{}]", names.join(", "))),
            Self::String => Ok(SettingData::Str(trimmed.to_string())),
            // Text keeps surrounding whitespace; it is displayed verbatim.
            Self::Text => Ok(SettingData::Text(raw.to_string())),
            Self::Vector => parse_vector(trimmed).map(SettingData::Vector),
            Self::Set(inner) => {
                let mut items = BTreeSet::new();
                for part in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    items.insert(inner.parse_raw(part)?);
                }
                Ok(SettingData::Set(items))
            }
        }
    }

    /// Convert a persisted JSON value into a value of this kind
    pub fn from_json(&self, json: &Json) -> Result<SettingData, String> {
        match (self, json) {
            (Self::Boolean, Json::Bool(b)) => Ok(SettingData::Bool(*b)),
            (Self::Integer, Json::Number(n)) => n
                .as_i64()
                .map(SettingData::Int)
                .ok_or_else(|| "number out of range".into()),
            (Self::Enum(names), Json::String(s)) => find_variant(names, s)
                .map(SettingData::Enum)
                .ok_or_else(|| format!("expected one of [{}]", names.join(", "))),
            (Self::String, Json::String(s)) => Ok(SettingData::Str(s.clone())),
            (Self::Text, Json::String(s)) => Ok(SettingData::Text(s.clone())),
            (Self::Vector, Json::Array(items)) if items.len() == 3 => {
                let mut c = [0i32; 3];
                for (slot, item) in c.iter_mut().zip(items) {
                    *slot = item
                        .as_i64()
                        .and_then(|n| i32::try_from(n).ok())
                        .ok_or_else(|| "vector components must be 32-bit integers".to_string())?;
                }
                Ok(SettingData::Vector(Vector3i::from(c)))
            }
            (Self::Set(inner), Json::Array(items)) => items
                .iter()
                .map(|item| inner.from_json(item))
                .collect::<Result<BTreeSet<_>, _>>()
                .map(SettingData::Set),
            _ => Err(format!("expected a {} value", self.name())),
        }
    }
}

fn find_variant(names: &'static [&'static str], input: &str) -> Option<&'static str> {
    names.iter().copied().find(|n| n.eq_ignore_ascii_case(input))
}

fn parse_vector(raw: &str) -> Result<Vector3i, String> {
    let parts: Vec<&str> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return Err("expected three coordinates, e.g. 10,64,-3".into());
    }
    let mut c = [0i32; 3];
    for (slot, part) in c.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a valid coordinate"))?;
    }
    Ok(Vector3i::from(c))
}

/// Erased setting value as stored by hosts
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingData {
    Bool(bool),
    Int(i64),
    Enum(&'static str),
    Str(String),
    Text(String),
    Vector(Vector3i),
    Set(BTreeSet<SettingData>),
}

impl SettingData {
    /// JSON form used by the persistence boundary
    pub fn to_json(&self) -> Json {
        match self {
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(n) => Json::from(*n),
            Self::Enum(name) => Json::String((*name).to_string()),
            Self::Str(s) | Self::Text(s) => Json::String(s.clone()),
            Self::Vector(v) => Json::from(vec![v.x, v.y, v.z]),
            Self::Set(items) => Json::Array(items.iter().map(SettingData::to_json).collect()),
        }
    }
}

impl fmt::Display for SettingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "allow"),
            Self::Bool(false) => write!(f, "deny"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Enum(name) => write!(f, "{name}"),
            Self::Str(s) | Self::Text(s) => write!(f, "{s}"),
            Self::Vector(v) => write!(f, "{},{},{}", v.x, v.y, v.z),
            Self::Set(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

// ============================================================================
// Typed values
// ============================================================================

/// A Rust type usable as a setting value
pub trait SettingType: Clone + PartialEq + Send + Sync + 'static {
    fn kind() -> ValueKind;
    fn to_data(&self) -> SettingData;
    fn from_data(data: &SettingData) -> Option<Self>;
}

impl SettingType for bool {
    fn kind() -> ValueKind {
        ValueKind::Boolean
    }
    fn to_data(&self) -> SettingData {
        SettingData::Bool(*self)
    }
    fn from_data(data: &SettingData) -> Option<Self> {
        match data {
            SettingData::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl SettingType for i64 {
    fn kind() -> ValueKind {
        ValueKind::Integer
    }
    fn to_data(&self) -> SettingData {
        SettingData::Int(*self)
    }
    fn from_data(data: &SettingData) -> Option<Self> {
        match data {
            SettingData::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl SettingType for String {
    fn kind() -> ValueKind {
        ValueKind::String
    }
    fn to_data(&self) -> SettingData {
        SettingData::Str(self.clone())
    }
    fn from_data(data: &SettingData) -> Option<Self> {
        match data {
            SettingData::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Formatted chat text (legacy `&` color codes are kept verbatim)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Text(pub String);

impl Text {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SettingType for Text {
    fn kind() -> ValueKind {
        ValueKind::Text
    }
    fn to_data(&self) -> SettingData {
        SettingData::Text(self.0.clone())
    }
    fn from_data(data: &SettingData) -> Option<Self> {
        match data {
            SettingData::Text(s) => Some(Text(s.clone())),
            _ => None,
        }
    }
}

impl SettingType for Vector3i {
    fn kind() -> ValueKind {
        ValueKind::Vector
    }
    fn to_data(&self) -> SettingData {
        SettingData::Vector(*self)
    }
    fn from_data(data: &SettingData) -> Option<Self> {
        match data {
            SettingData::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

impl<T: SettingType + Ord> SettingType for BTreeSet<T> {
    fn kind() -> ValueKind {
        ValueKind::Set(Box::new(T::kind()))
    }
    fn to_data(&self) -> SettingData {
        SettingData::Set(self.iter().map(T::to_data).collect())
    }
    fn from_data(data: &SettingData) -> Option<Self> {
        match data {
            SettingData::Set(items) => items.iter().map(T::from_data).collect(),
            _ => None,
        }
    }
}

/// Declare a closed enum usable as a setting value.
///
/// ```
/// zoneguard_engine::setting_enum! {
///     /// Time of day override.
///     pub enum DayTime {
///         Day => "day",
///         Night => "night",
///     }
/// }
/// assert_eq!(DayTime::from_name("night"), Some(DayTime::Night));
/// ```
#[macro_export]
macro_rules! setting_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$($label),+];

            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                $( if name.eq_ignore_ascii_case($label) { return Some(Self::$variant); } )+
                None
            }
        }

        impl $crate::setting::SettingType for $name {
            fn kind() -> $crate::setting::ValueKind {
                $crate::setting::ValueKind::Enum(Self::NAMES)
            }
            fn to_data(&self) -> $crate::setting::SettingData {
                $crate::setting::SettingData::Enum(self.name())
            }
            fn from_data(data: &$crate::setting::SettingData) -> Option<Self> {
                match data {
                    $crate::setting::SettingData::Enum(n) => Self::from_name(n),
                    _ => None,
                }
            }
        }
    };
}

// ============================================================================
// Metadata
// ============================================================================

/// Grouping used for listing and help output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Building,
    Combat,
    Movement,
    Environment,
    Entities,
    Items,
    Messages,
    Admin,
}

/// Static metadata of a setting key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingMeta {
    pub category: Category,
    /// Restricts what players may do (as opposed to environment behavior).
    /// Typically targeted at non-members with a blacklist.
    pub player_restrictive: bool,
    /// May only be set on the global host
    pub global_only: bool,
    pub description: &'static str,
}

impl SettingMeta {
    pub const fn new(category: Category) -> Self {
        Self {
            category,
            player_restrictive: false,
            global_only: false,
            description: "",
        }
    }

    pub const fn player_restrictive(mut self) -> Self {
        self.player_restrictive = true;
        self
    }

    pub const fn global_only(mut self) -> Self {
        self.global_only = true;
        self
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

// ============================================================================
// Keys
// ============================================================================

/// Typed identity of a setting. Equality and hashing use the id only.
pub struct SettingKey<T> {
    id: &'static str,
    default: T,
    meta: SettingMeta,
}

impl<T: SettingType> SettingKey<T> {
    pub fn new(id: &'static str, default: T, meta: SettingMeta) -> Self {
        Self { id, default, meta }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn meta(&self) -> &SettingMeta {
        &self.meta
    }

    /// Erased description of this key for the registry
    pub fn descriptor(&self) -> KeyDescriptor {
        KeyDescriptor {
            id: self.id,
            kind: T::kind(),
            default: self.default.to_data(),
            meta: self.meta,
        }
    }
}

impl<T> PartialEq for SettingKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for SettingKey<T> {}

impl<T> Hash for SettingKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for SettingKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingKey").field("id", &self.id).finish()
    }
}

/// Erased key as held by the registry: id, kind, default and metadata
#[derive(Debug, Clone)]
pub struct KeyDescriptor {
    pub id: &'static str,
    pub kind: ValueKind,
    pub default: SettingData,
    pub meta: SettingMeta,
}

impl KeyDescriptor {
    /// Parse command input for this key
    pub fn parse(&self, raw: &str) -> Result<SettingData, SettingError> {
        self.kind.parse_raw(raw).map_err(|reason| SettingError::Parse {
            key: self.id.to_string(),
            input: raw.to_string(),
            reason,
        })
    }

    /// Convert a persisted JSON value for this key
    pub fn parse_json(&self, json: &Json) -> Result<SettingData, SettingError> {
        self.kind.from_json(json).map_err(|reason| SettingError::Parse {
            key: self.id.to_string(),
            input: json.to_string(),
            reason,
        })
    }
}

impl PartialEq for KeyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for KeyDescriptor {}

impl Hash for KeyDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
