//! In-memory store for unit testing.
//!
//! Behaves like an [`IniFile`](super::IniFile) without touching the disk and
//! records every write so tests can assert on what a parameter pushed.

use std::collections::HashMap;

use super::KeyValueStore;

/// A [`KeyValueStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<(String, String), String>,
    writes: Vec<(String, String, String)>,
    empty: bool,
}

impl MemoryStore {
    /// Creates a store that reports itself as empty, like a missing file.
    pub fn new() -> Self {
        Self {
            empty: true,
            ..Self::default()
        }
    }

    /// Creates a non-empty store pre-populated with `(section, key, value)`.
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        let values = values
            .into_iter()
            .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
            .collect();
        Self {
            values,
            writes: Vec::new(),
            empty: false,
        }
    }

    /// Every `set` call in order, as `(section, key, value)`.
    pub fn writes(&self) -> &[(String, String, String)] {
        &self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .map(String::as_str)
    }

    fn set(&mut self, section: &str, key: &str, value: String) {
        self.writes
            .push((section.to_string(), key.to_string(), value.clone()));
        self.values
            .insert((section.to_string(), key.to_string()), value);
    }

    fn is_empty(&self) -> bool {
        self.empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_new_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("S", "K"), None);
    }

    #[test]
    fn test_memory_store_records_writes() {
        // Arrange
        let mut store = MemoryStore::with_values([("S", "A", "1")]);

        // Act
        store.set("S", "B", "2".to_string());

        // Assert
        assert!(!store.is_empty());
        assert_eq!(store.get("S", "A"), Some("1"));
        assert_eq!(store.get("S", "B"), Some("2"));
        assert_eq!(
            store.writes(),
            &[("S".to_string(), "B".to_string(), "2".to_string())]
        );
    }
}
