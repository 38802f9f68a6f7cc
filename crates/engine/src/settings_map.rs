//! Per-host settings storage.

use rustc_hash::FxHashMap;

use crate::error::SettingError;
use crate::setting::{KeyDescriptor, SettingData, SettingKey, SettingType};
use crate::target::TargetPredicate;

/// A typed value with its target predicate
#[derive(Debug, Clone, PartialEq)]
pub struct SettingValue<T> {
    pub data: T,
    pub target: TargetPredicate,
}

impl<T> SettingValue<T> {
    /// Value applying to everyone
    pub fn new(data: T) -> Self {
        Self {
            data,
            target: TargetPredicate::everyone(),
        }
    }

    pub fn with_target(mut self, target: TargetPredicate) -> Self {
        self.target = target;
        self
    }
}

/// Erased stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub data: SettingData,
    pub target: TargetPredicate,
}

impl StoredValue {
    fn typed<T: SettingType>(self) -> Option<SettingValue<T>> {
        let data = T::from_data(&self.data)?;
        Some(SettingValue {
            data,
            target: self.target,
        })
    }
}

/// Map of setting id to stored value. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsMap {
    values: FxHashMap<&'static str, StoredValue>,
}

impl SettingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: SettingType>(&self, key: &SettingKey<T>) -> Option<SettingValue<T>> {
        self.values.get(key.id()).cloned().and_then(StoredValue::typed)
    }

    pub fn get_raw(&self, id: &str) -> Option<&StoredValue> {
        self.values.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// Insert or replace a value, returning the previous one
    pub fn put<T: SettingType>(
        &mut self,
        key: &SettingKey<T>,
        value: SettingValue<T>,
    ) -> Option<SettingValue<T>> {
        let stored = StoredValue {
            data: value.data.to_data(),
            target: value.target,
        };
        self.values
            .insert(key.id(), stored)
            .and_then(StoredValue::typed)
    }

    /// Insert an erased value after checking it against the key's kind
    pub fn put_data(
        &mut self,
        descriptor: &KeyDescriptor,
        data: SettingData,
        target: TargetPredicate,
    ) -> Result<Option<StoredValue>, SettingError> {
        if !descriptor.kind.matches(&data) {
            return Err(SettingError::TypeMismatch {
                key: descriptor.id.to_string(),
                expected: descriptor.kind.name(),
            });
        }
        Ok(self.values.insert(descriptor.id, StoredValue { data, target }))
    }

    pub fn remove<T: SettingType>(&mut self, key: &SettingKey<T>) -> Option<SettingValue<T>> {
        self.values.remove(key.id()).and_then(StoredValue::typed)
    }

    pub fn remove_raw(&mut self, id: &str) -> Option<StoredValue> {
        self.values.remove(id)
    }

    /// Mutable access to a stored value's target (command-layer edits)
    pub fn target_mut(&mut self, id: &str) -> Option<&mut TargetPredicate> {
        self.values.get_mut(id).map(|v| &mut v.target)
    }

    /// All entries, sorted by key id
    pub fn entries(&self) -> Vec<(&'static str, &StoredValue)> {
        let mut entries: Vec<_> = self.values.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags;
    use uuid::Uuid;

    #[test]
    fn test_put_returns_previous() {
        let mut map = SettingsMap::new();
        assert!(map.put(&flags::PVP, SettingValue::new(false)).is_none());
        let prev = map.put(&flags::PVP, SettingValue::new(true)).unwrap();
        assert!(!prev.data);
        assert!(map.get(&flags::PVP).unwrap().data);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_returns_previous() {
        let mut map = SettingsMap::new();
        map.put(&flags::HEAL_AMOUNT, SettingValue::new(4));
        assert_eq!(map.remove(&flags::HEAL_AMOUNT).unwrap().data, 4);
        assert!(map.remove(&flags::HEAL_AMOUNT).is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_put_data_checks_kind() {
        let mut map = SettingsMap::new();
        let descriptor = flags::PVP.descriptor();
        let err = map
            .put_data(&descriptor, SettingData::Int(1), TargetPredicate::everyone())
            .unwrap_err();
        assert!(matches!(err, SettingError::TypeMismatch { .. }));
        assert!(map
            .put_data(&descriptor, SettingData::Bool(false), TargetPredicate::everyone())
            .unwrap()
            .is_none());
        assert!(!map.get(&flags::PVP).unwrap().data);
    }

    #[test]
    fn test_entries_sorted() {
        let mut map = SettingsMap::new();
        map.put(&flags::PVP, SettingValue::new(false));
        map.put(&flags::BUILD, SettingValue::new(false));
        map.put(&flags::GREETING, SettingValue::new(crate::setting::Text::new("hi")));
        let ids: Vec<&str> = map.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(ids, vec!["build", "greeting", "pvp"]);
    }

    #[test]
    fn test_target_mut() {
        let mut map = SettingsMap::new();
        map.put(&flags::BUILD, SettingValue::new(false));
        let target = map.target_mut("build").unwrap();
        assert!(target.add_actor(Uuid::from_u128(1)));
        assert_eq!(map.get(&flags::BUILD).unwrap().target.actors().count(), 1);
        assert!(map.target_mut("pvp").is_none());
    }
}
