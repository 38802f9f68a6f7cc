//! Catalog of every known setting key.
//!
//! Built once at startup and shared by `Arc`. Never mutated afterwards.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::RegistryError;
use crate::flags;
use crate::setting::{Category, KeyDescriptor, SettingKey, SettingType};

/// Immutable table of setting keys, iterated in registration order
#[derive(Debug)]
pub struct SettingRegistry {
    keys: Vec<KeyDescriptor>,
    by_id: FxHashMap<&'static str, usize>,
}

impl SettingRegistry {
    /// Registry of the built-in flags
    pub fn builtin() -> Arc<Self> {
        let mut builder = Self::builder();
        for descriptor in flags::all() {
            builder = builder.register_descriptor(descriptor);
        }
        match builder.build() {
            Ok(registry) => Arc::new(registry),
            // Built-in ids are fixed at compile time and covered by tests.
            Err(e) => panic!("built-in setting table is invalid: {e}"),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, id: &str) -> Option<&KeyDescriptor> {
        self.by_id.get(id).map(|&i| &self.keys[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyDescriptor> {
        self.keys.iter()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &KeyDescriptor> {
        self.keys.iter().filter(move |d| d.meta.category == category)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Collects keys and validates them once in `build()`
#[derive(Default)]
pub struct RegistryBuilder {
    keys: Vec<KeyDescriptor>,
}

impl RegistryBuilder {
    pub fn register<T: SettingType>(self, key: &SettingKey<T>) -> Self {
        self.register_descriptor(key.descriptor())
    }

    pub fn register_descriptor(mut self, descriptor: KeyDescriptor) -> Self {
        self.keys.push(descriptor);
        self
    }

    /// Validate ids (non-empty, `[a-z0-9_-]`, unique) and freeze the table
    pub fn build(self) -> Result<SettingRegistry, RegistryError> {
        let mut by_id = FxHashMap::default();
        for (i, descriptor) in self.keys.iter().enumerate() {
            if !is_valid_id(descriptor.id) {
                return Err(RegistryError::InvalidId(descriptor.id.to_string()));
            }
            if by_id.insert(descriptor.id, i).is_some() {
                return Err(RegistryError::DuplicateKey(descriptor.id.to_string()));
            }
        }
        Ok(SettingRegistry {
            keys: self.keys,
            by_id,
        })
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}
