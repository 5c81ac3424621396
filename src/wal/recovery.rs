//! Command log replay
//!
//! Startup-time recovery: replay every logged mutation against the store,
//! as the root user, with the clock frozen to each record's logical
//! timestamp so TTL math lands where the live execution put it.
//!
//! Replay is maximally resilient: unparseable lines and records that no
//! longer validate (a since-deleted database, a key that never made it
//! into the snapshot) are logged and skipped, never fatal. Only internal
//! errors abort recovery.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;
use crate::store::Store;
use crate::wal::LogRecord;

/// Outcome counters for one replay pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryResult {
    /// Records applied successfully
    pub records_replayed: usize,

    /// Records skipped (unparseable or no longer valid)
    pub records_skipped: usize,
}

/// Replay the command log at `path` into `store`, then sweep and delete
/// the log. A missing file is a clean start, not an error.
pub fn replay(store: &mut Store, path: &Path) -> Result<RecoveryResult> {
    if !path.exists() {
        tracing::info!("no command log found");
        return Ok(RecoveryResult::default());
    }

    let mut result = RecoveryResult::default();
    let reader = BufReader::new(File::open(path)?);
    let root = store.root_user().to_string();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = match LogRecord::parse(&line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("skipping unparseable log record: {e}");
                result.records_skipped += 1;
                continue;
            }
        };

        // Backdate the clock so any TTL computed by this record reflects
        // the original execution time, not wall-clock now.
        store.clock_mut().freeze(record.timestamp);

        match store.apply(&root, &record.mutation) {
            Ok(()) => result.records_replayed += 1,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    "skipping stale log record `{} {}`: {e}",
                    record.mutation.command_name(),
                    record.mutation.database()
                );
                result.records_skipped += 1;
            }
            Err(e) => {
                store.clock_mut().thaw();
                return Err(e);
            }
        }
    }

    store.clock_mut().thaw();

    // Anything whose backdated TTL has already passed must not survive
    // recovery.
    let purged = store.sweep_expired();

    fs::remove_file(path)?;
    tracing::info!(
        "command log replayed: {} applied, {} skipped, {} expired key(s) purged",
        result.records_replayed,
        result.records_skipped,
        purged
    );

    Ok(result)
}
