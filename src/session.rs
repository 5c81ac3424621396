//! Per-connection session state
//!
//! Temporary storage for a connected client during the lifetime of its
//! connection: who is logged in, which database is selected, the params of
//! the command being dispatched, and the last response written. Never
//! persisted; discarded when the connection closes.
//!
//! The selected database is tracked by name and re-resolved against the
//! store on each data command. Resolution happens under the same lock as
//! the mutation itself, so the semantics match holding a direct reference,
//! and a database deleted mid-session surfaces as `DbNotExist` on next
//! use.

/// Mutable per-connection state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Logged-in username; empty means not logged in
    pub username: String,

    /// Selected database name; empty means none selected
    pub database_name: String,

    /// Parameters of the command currently being dispatched
    pub params: Vec<String>,

    /// Response text of the most recent command
    pub response: String,
}

impl Session {
    /// Fresh state for a new connection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        !self.username.is_empty()
    }

    pub fn has_database(&self) -> bool {
        !self.database_name.is_empty()
    }

    /// Drop any database selection (used on login).
    pub fn clear_selection(&mut self) {
        self.database_name.clear();
    }
}
