//! Case-insensitive associative container for field and table names.
//!
//! FileMaker treats field and table occurrence names case-insensitively, so
//! every lookup canonicalises the key to lowercase at the boundary. The name
//! as first inserted is kept for display and serialization, and iteration
//! follows insertion order.

use std::collections::HashMap;

use serde::{Serialize, Serializer, ser::SerializeMap};

#[derive(Debug, Clone, PartialEq)]
pub struct CaseInsensitiveMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

pub(crate) fn canonical(key: &str) -> String {
    key.to_lowercase()
}

impl<V> CaseInsensitiveMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value stored under the same
    /// name in any casing. The original spelling of the first insert is kept.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.index.get(&canonical(&key)) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, value)),
            None => {
                self.index.insert(canonical(&key), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(&canonical(key)).map(|&slot| &self.entries[slot].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.index.get(&canonical(key)) {
            Some(&slot) => Some(&mut self.entries[slot].1),
            None => None,
        }
    }

    /// Returns the stored (case-preserved) spelling of a key.
    pub fn original_key(&self, key: &str) -> Option<&str> {
        self.index
            .get(&canonical(key))
            .map(|&slot| self.entries[slot].0.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&canonical(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for CaseInsensitiveMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for CaseInsensitiveMap<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
