//! Database collection snapshot
//!
//! Full bincode serialization of the database collection, written at the
//! shutdown checkpoint and loaded on startup. User credentials and
//! ownership indices are not part of the snapshot; they are write-through
//! persisted by `PersistentMap`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, WardenError};
use crate::store::Database;

/// Serialize the database collection to `path` (temp-then-rename).
pub fn save(path: &Path, dbs: &HashMap<String, Database>) -> Result<()> {
    let raw = bincode::serialize(dbs).map_err(|e| WardenError::Serialization(e.to_string()))?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, raw)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a snapshot if one exists. A missing file is a clean cold start,
/// not an error.
pub fn load(path: &Path) -> Result<Option<HashMap<String, Database>>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read(path)?;
    let dbs = bincode::deserialize(&raw)
        .map_err(|e| WardenError::Serialization(format!("corrupt snapshot: {e}")))?;
    Ok(Some(dbs))
}
