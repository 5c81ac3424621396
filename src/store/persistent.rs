//! Write-through persistent maps
//!
//! A string-keyed map whose every mutation rewrites a JSON file in full,
//! and which loads from that file on open. Backs the user credential
//! table and both ownership indices: small maps where full rewrite per
//! mutation is cheaper than any log-structured scheme.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, WardenError};

/// A durable key -> value map, persisted on every mutation.
#[derive(Debug)]
pub struct PersistentMap<V> {
    path: PathBuf,
    entries: HashMap<String, V>,
}

impl<V: Serialize + DeserializeOwned> PersistentMap<V> {
    /// Open the map at `path`, loading existing contents or creating an
    /// empty file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut map = Self {
            path,
            entries: HashMap::new(),
        };
        if map.path.exists() {
            let raw = fs::read(&map.path)?;
            map.entries = serde_json::from_slice(&raw)
                .map_err(|e| WardenError::Serialization(format!("corrupt map file: {e}")))?;
        } else {
            map.persist()?;
        }
        Ok(map)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace, then persist.
    pub fn insert(&mut self, key: String, value: V) -> Result<()> {
        self.entries.insert(key, value);
        self.persist()
    }

    /// Remove, then persist. Returns the removed value if any.
    pub fn remove(&mut self, key: &str) -> Result<Option<V>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the backing file in full.
    ///
    /// Writes to a sibling temp file and renames over the target, so a
    /// crash mid-write leaves the previous generation intact.
    fn persist(&self) -> Result<()> {
        let raw = serde_json::to_vec(&self.entries)
            .map_err(|e| WardenError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
