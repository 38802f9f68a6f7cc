//! Block coordinates, axis-aligned bounds and world locations.
//!
//! Coordinates are integer block positions. A `Bounds` is inclusive on both
//! ends of every axis. Unbounded axes use `i32::MIN` / `i32::MAX` sentinels,
//! so containment needs no special casing.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ZoneError;

/// An integer block position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct Vector3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vector3i {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component on the given axis
    pub fn get(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    fn set(&mut self, axis: Axis, value: i32) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    /// Component-wise minimum
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

impl From<[i32; 3]> for Vector3i {
    fn from(v: [i32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vector3i> for [i32; 3] {
    fn from(v: Vector3i) -> Self {
        [v.x, v.y, v.z]
    }
}

impl fmt::Display for Vector3i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Inclusive axis-aligned bounding box.
///
/// # Invariants
///
/// `min <= max` on every axis. Constructors enforce this; fields are private
/// so a malformed box cannot be built from outside the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBounds", into = "RawBounds")]
pub struct Bounds {
    min: Vector3i,
    max: Vector3i,
}

#[derive(Serialize, Deserialize)]
struct RawBounds {
    min: Vector3i,
    max: Vector3i,
}

impl TryFrom<RawBounds> for Bounds {
    type Error = ZoneError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Bounds::new(raw.min, raw.max)
    }
}

impl From<Bounds> for RawBounds {
    fn from(b: Bounds) -> Self {
        RawBounds { min: b.min, max: b.max }
    }
}

impl Bounds {
    /// Sentinel used for the lower end of an unbounded axis
    pub const UNBOUNDED_MIN: i32 = i32::MIN;
    /// Sentinel used for the upper end of an unbounded axis
    pub const UNBOUNDED_MAX: i32 = i32::MAX;

    /// Create bounds from explicit corners. Fails if `min > max` on any axis.
    pub fn new(min: Vector3i, max: Vector3i) -> Result<Self, ZoneError> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(ZoneError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Create bounds from two arbitrary corners (e.g. a selection). Never fails.
    pub fn from_corners(a: Vector3i, b: Vector3i) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Bounds covering every representable block
    pub fn everywhere() -> Self {
        Self {
            min: Vector3i::new(Self::UNBOUNDED_MIN, Self::UNBOUNDED_MIN, Self::UNBOUNDED_MIN),
            max: Vector3i::new(Self::UNBOUNDED_MAX, Self::UNBOUNDED_MAX, Self::UNBOUNDED_MAX),
        }
    }

    /// Same box with `axis` extended to infinity in both directions
    pub fn with_unbounded(mut self, axis: Axis) -> Self {
        self.min.set(axis, Self::UNBOUNDED_MIN);
        self.max.set(axis, Self::UNBOUNDED_MAX);
        self
    }

    pub fn min(&self) -> Vector3i {
        self.min
    }

    pub fn max(&self) -> Vector3i {
        self.max
    }

    /// True if the axis spans the full coordinate range
    pub fn is_unbounded(&self, axis: Axis) -> bool {
        self.min.get(axis) == Self::UNBOUNDED_MIN && self.max.get(axis) == Self::UNBOUNDED_MAX
    }

    /// Inclusive containment test. Unbounded axes match every coordinate.
    #[inline]
    pub fn contains(&self, p: Vector3i) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Check if this box shares at least one block with another
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y
            || self.max.z < other.min.z
            || self.min.z > other.max.z)
    }

    /// Number of blocks inside the box
    pub fn volume(&self) -> u128 {
        Axis::ALL
            .iter()
            .map(|&axis| (self.max.get(axis) as i64 - self.min.get(axis) as i64 + 1) as u128)
            .product()
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.min, self.max)
    }
}

/// Identity of a world. Worlds are registered with the hierarchy by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub Uuid);

impl WorldId {
    pub fn from_u128(v: u128) -> Self {
        Self(Uuid::from_u128(v))
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A block position in a specific world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub world: WorldId,
    pub position: Vector3i,
}

impl Location {
    pub fn new(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Self {
            world,
            position: Vector3i::new(x, y, z),
        }
    }
}
