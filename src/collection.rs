use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Owned quantity per item name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    items: BTreeMap<String, u32>,
}

impl Collection {
    /// Add `quantity` to `name`, creating the entry if needed. Returns the new total.
    pub fn add(&mut self, name: &str, quantity: u32) -> u32 {
        let owned = self.items.entry(name.to_string()).or_insert(0);
        *owned = owned.saturating_add(quantity);
        *owned
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.items.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(name, quantity)| (name.as_str(), *quantity))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Binary snapshot of a [`Collection`], rewritten in full on every save.
pub struct CollectionStore {
    path: PathBuf,
}

impl CollectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Collection> {
        if !self.path.is_file() {
            return Ok(Collection::default());
        }
        let bytes = std::fs::read(&self.path)?;
        Ok(bitcode::deserialize(&bytes)?)
    }

    pub fn save(&self, collection: &Collection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = bitcode::serialize(collection)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_then_increments() {
        let mut collection = Collection::default();
        assert_eq!(collection.add("Pikachu V", 3), 3);
        assert_eq!(collection.add("Pikachu V", 2), 5);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("Pikachu V"), Some(5));
    }

    #[test]
    fn add_saturates() {
        let mut collection = Collection::default();
        collection.add("Arceus VSTAR", u32::MAX);
        assert_eq!(collection.add("Arceus VSTAR", 1), u32::MAX);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CollectionStore::new(dir.path().join("nested/card_collection.bin"));

        let mut collection = Collection::default();
        collection.add("Pikachu V", 3);
        collection.add("Zacian V", 1);
        store.save(&collection).unwrap();

        assert_eq!(store.load().unwrap(), collection);
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = CollectionStore::new(dir.path().join("card_collection.bin"));

        let mut first = Collection::default();
        first.add("Pikachu V", 3);
        store.save(&first).unwrap();

        let mut second = Collection::default();
        second.add("Zacian V", 1);
        store.save(&second).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.get("Pikachu V"), None);
        assert_eq!(loaded.get("Zacian V"), Some(1));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CollectionStore::new(dir.path().join("card_collection.bin"));
        assert!(store.load().unwrap().is_empty());
    }
}
