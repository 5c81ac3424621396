//! Command log writer
//!
//! Append-only writer for the write-ahead command log. The file is
//! created lazily on the first append, so a server that performs no
//! mutations leaves no log behind.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;
use crate::wal::LogRecord;

/// Appends records to the command log, syncing per the configured
/// strategy.
pub struct LogWriter {
    path: PathBuf,
    file: Option<File>,
    strategy: WalSyncStrategy,

    /// Appends since the last fsync (EveryNEntries bookkeeping)
    unsynced: usize,
}

impl LogWriter {
    /// Create a writer for the log at `path`. Does not touch the
    /// filesystem until the first append.
    pub fn open(path: impl Into<PathBuf>, strategy: WalSyncStrategy) -> Self {
        Self {
            path: path.into(),
            file: None,
            strategy,
            unsynced: 0,
        }
    }

    /// Append one record and sync per strategy.
    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        if self.file.is_none() {
            self.file = Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?,
            );
        }
        let file = self.file.as_mut().expect("file opened above");

        let mut line = record.to_line();
        line.push('\n');
        file.write_all(line.as_bytes())?;

        self.unsynced += 1;
        let sync_now = match self.strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if sync_now {
            file.sync_data()?;
            self.unsynced = 0;
        }
        Ok(())
    }

    /// Close the handle and delete the log file. Called at checkpoint once
    /// the log's effects are captured in the snapshot.
    pub fn remove(&mut self) -> Result<()> {
        self.file = None;
        self.unsynced = 0;
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
