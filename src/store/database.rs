//! A single named database
//!
//! An owned key -> value map with an independent key -> expiry map.
//!
//! Invariant: every key in the expiry map is also present in the value
//! map. Deletion always clears the expiry entry, and a TTL can only be
//! attached to a key that exists.
//!
//! Expiry is enforced by `sweep_expired`, not on read: a key past its
//! expiry but not yet swept is still visible to `get`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WardenError};

/// An owned key-value map with per-key expiry tracking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    /// key -> value
    entries: HashMap<String, String>,

    /// key -> absolute expiry timestamp (unix seconds)
    expiry: HashMap<String, u64>,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or(WardenError::InvalidKey)
    }

    /// Unconditional upsert. Does not touch the expiry map; TTL state is
    /// managed by `set_ttl`/`remove_ttl`.
    pub fn put(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    /// Overwrite an existing key, preserving any expiry entry.
    pub fn update(&mut self, key: &str, value: String) -> Result<()> {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(WardenError::InvalidKey),
        }
    }

    /// Remove a key and its expiry entry. Idempotent: deleting an absent
    /// key is not an error.
    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
        self.expiry.remove(key);
    }

    /// Set `expiry[key] = now + ttl_seconds`, overwriting any previous
    /// expiry. Ignored if the key is absent (an expiry entry without a
    /// value would be meaningless).
    pub fn set_ttl(&mut self, key: &str, ttl_seconds: u64, now: u64) {
        if self.entries.contains_key(key) {
            self.expiry
                .insert(key.to_string(), now.saturating_add(ttl_seconds));
        }
    }

    /// Clear any expiry entry for `key`. No-op if none exists.
    pub fn remove_ttl(&mut self, key: &str) {
        self.expiry.remove(key);
    }

    /// Delete every key whose expiry is at or before `now`. Returns the
    /// number of keys purged.
    ///
    /// Expired keys are collected first so removal never mutates the map
    /// being scanned.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let expired: Vec<String> = self
            .expiry
            .iter()
            .filter(|(_, &deadline)| deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.delete(key);
        }
        expired.len()
    }

    /// Absolute expiry timestamp for `key`, if one is set.
    pub fn expires_at(&self, key: &str) -> Option<u64> {
        self.expiry.get(key).copied()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the database holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
