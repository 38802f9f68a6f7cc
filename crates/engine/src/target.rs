//! Actor targeting for stored setting values.
//!
//! Each stored value carries a `TargetPredicate` deciding which actors it
//! applies to. A rejected actor does not stop resolution; the resolver falls
//! through to the next host.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something that triggers a setting check: usually a player.
///
/// Implemented by the event layer over the game's player/permission system.
pub trait Subject {
    fn id(&self) -> Uuid;
    fn has_permission(&self, node: &str) -> bool;
}

/// A plain actor with a fixed permission set.
///
/// Permission nodes are dotted; holding `zone.admin` grants every node below
/// it (`zone.admin.bypass`), but not `zone.administrator`.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    id: Uuid,
    permissions: FxHashSet<String>,
}

impl Actor {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            permissions: FxHashSet::default(),
        }
    }

    pub fn with_permission(mut self, node: impl Into<String>) -> Self {
        self.permissions.insert(node.into());
        self
    }
}

impl Subject for Actor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn has_permission(&self, node: &str) -> bool {
        if self.permissions.contains(node) {
            return true;
        }
        // Walk parent nodes: a.b.c -> a.b -> a
        let mut rest = node;
        while let Some(dot) = rest.rfind('.') {
            rest = &rest[..dot];
            if self.permissions.contains(rest) {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// Applies only to listed actors / permission holders
    Whitelist,
    /// Applies to everyone except listed actors / permission holders
    #[default]
    Blacklist,
}

/// Whitelist or blacklist of actor ids and permission nodes.
///
/// The default is an empty blacklist: the value applies to everyone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetPredicate {
    mode: TargetMode,
    actors: BTreeSet<Uuid>,
    permissions: BTreeSet<String>,
}

impl TargetPredicate {
    /// Applies to everyone
    pub fn everyone() -> Self {
        Self::default()
    }

    pub fn whitelist() -> Self {
        Self {
            mode: TargetMode::Whitelist,
            ..Self::default()
        }
    }

    pub fn blacklist() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, id: Uuid) -> Self {
        self.actors.insert(id);
        self
    }

    pub fn with_permission(mut self, node: impl Into<String>) -> Self {
        self.permissions.insert(node.into());
        self
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    pub fn actors(&self) -> impl Iterator<Item = &Uuid> {
        self.actors.iter()
    }

    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// True if this is the default "applies to everyone" predicate
    pub fn is_everyone(&self) -> bool {
        self.mode == TargetMode::Blacklist && self.actors.is_empty() && self.permissions.is_empty()
    }

    /// Decide whether the value applies to `actor`.
    ///
    /// Anonymous lookups (`None`) see the public value: they are accepted by
    /// every predicate except a blacklist that names actors and lists no
    /// permissions.
    pub fn accepts(&self, actor: Option<&dyn Subject>) -> bool {
        match actor {
            Some(subject) => {
                let matched = self.matches(subject);
                match self.mode {
                    TargetMode::Whitelist => matched,
                    TargetMode::Blacklist => !matched,
                }
            }
            None => !(self.mode == TargetMode::Blacklist
                && !self.actors.is_empty()
                && self.permissions.is_empty()),
        }
    }

    fn matches(&self, subject: &dyn Subject) -> bool {
        self.actors.contains(&subject.id())
            || self.permissions.iter().any(|node| subject.has_permission(node))
    }

    // ------------------------------------------------------------------------
    // Mutations. Each returns true if the predicate actually changed.
    // ------------------------------------------------------------------------

    pub fn add_actor(&mut self, id: Uuid) -> bool {
        self.actors.insert(id)
    }

    pub fn remove_actor(&mut self, id: &Uuid) -> bool {
        self.actors.remove(id)
    }

    pub fn add_permission(&mut self, node: impl Into<String>) -> bool {
        self.permissions.insert(node.into())
    }

    pub fn remove_permission(&mut self, node: &str) -> bool {
        self.permissions.remove(node)
    }

    pub fn set_whitelist(&mut self) -> bool {
        self.set_mode(TargetMode::Whitelist)
    }

    pub fn set_blacklist(&mut self) -> bool {
        self.set_mode(TargetMode::Blacklist)
    }

    fn set_mode(&mut self, mode: TargetMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    /// Reset to "applies to everyone"
    pub fn clear(&mut self) -> bool {
        let changed = !self.is_everyone();
        *self = Self::default();
        changed
    }

    pub fn to_descriptor(&self) -> TargetDescriptor {
        TargetDescriptor {
            mode: self.mode,
            actors: self.actors.iter().copied().collect(),
            permissions: self.permissions.iter().cloned().collect(),
        }
    }
}

/// Persisted form of a target predicate
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDescriptor {
    pub mode: TargetMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

impl TargetDescriptor {
    pub fn is_everyone(&self) -> bool {
        self.mode == TargetMode::Blacklist && self.actors.is_empty() && self.permissions.is_empty()
    }
}

impl From<TargetDescriptor> for TargetPredicate {
    fn from(d: TargetDescriptor) -> Self {
        Self {
            mode: d.mode,
            actors: d.actors.into_iter().collect(),
            permissions: d.permissions.into_iter().collect(),
        }
    }
}
