//! Router Module
//!
//! Maps each input line to a handler pipeline and runs it against the
//! per-connection session and the shared store.
//!
//! ## Responsibilities
//! - Parse each line into a command kind and parameters
//! - Run the kind's pipeline, short-circuiting on the first failure
//! - Turn recoverable errors into response lines
//! - Append successful mutating commands to the write-ahead log
//! - Own the startup (replay) and shutdown (checkpoint) protocols
//!
//! ## Dispatch
//! ```text
//! line ──parse──▶ CommandKind ──▶ [pre, pre, action] ──▶ response
//!                                       │ first Err
//!                                       ▼
//!                               error display as response
//! ```

pub mod command;
pub mod handlers;

pub use command::{parse_line, CommandKind, MAX_PARAMS};

use crate::config::Config;
use crate::error::Result;
use crate::session::Session;
use crate::store::Store;
use crate::wal::{self, LogRecord, LogWriter};

/// A pipeline stage: reads/writes the session, may mutate the store,
/// returns the response text on success.
pub type Handler = fn(&mut Session, &mut Store) -> Result<String>;

/// Owns the store and the command log; dispatches one line at a time.
pub struct Router {
    store: Store,
    log: LogWriter,
}

impl Router {
    /// Assemble a router from already-opened parts.
    pub fn new(store: Store, log: LogWriter) -> Self {
        Self { store, log }
    }

    /// Run the full startup protocol: open the store (maps + snapshot +
    /// root user), replay the command log if present, then stand up the
    /// log writer for new mutations.
    pub fn open(config: &Config) -> Result<Self> {
        let mut store = Store::open(config)?;
        let log_path = store.command_log_path();
        wal::replay(&mut store, &log_path)?;
        let log = LogWriter::open(log_path, config.wal_sync_strategy);
        Ok(Self { store, log })
    }

    /// Dispatch one input line against a session.
    ///
    /// Returns the response text; errors from the command taxonomy are
    /// folded into it. An `Err` from this method is an internal failure
    /// (log append, write-through persistence) and the caller must treat
    /// it as fatal to the process.
    pub fn dispatch(&mut self, session: &mut Session, line: &str) -> Result<String> {
        let response = match self.dispatch_inner(session, line) {
            Ok(response) => response,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("command failed: {e}");
                e.to_string()
            }
            Err(e) => return Err(e),
        };
        session.response = response.clone();
        Ok(response)
    }

    fn dispatch_inner(&mut self, session: &mut Session, line: &str) -> Result<String> {
        let (kind, params) = parse_line(line)?;
        session.params = params;

        let mut response = String::new();
        for handler in kind.pipeline() {
            response = handler(session, &mut self.store)?;
        }

        // Only reached on success: record the mutation with the logical
        // time at which it executed.
        if kind.is_logged() {
            if let Some(mutation) = kind.mutation(session) {
                let record = LogRecord::new(self.store.clock().now(), mutation);
                self.log.append(&record)?;
            }
        }

        Ok(response)
    }

    /// One expiry sweep across all databases. Returns keys purged.
    pub fn sweep_expired(&mut self) -> usize {
        self.store.sweep_expired()
    }

    /// Shutdown checkpoint: snapshot the database collection, then drop
    /// the command log whose effects it captures.
    pub fn checkpoint(&mut self) -> Result<()> {
        self.store.save_snapshot()?;
        self.log.remove()?;
        tracing::info!("checkpoint written, command log cleared");
        Ok(())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }
}
