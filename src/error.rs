//! Error types for WardenKV
//!
//! Provides a unified error type for all operations.
//!
//! Variants split into two groups. The command taxonomy is recoverable at
//! the dispatch boundary: the display string becomes the response line and
//! the connection keeps going. `Io` and `Serialization` are internal and
//! fatal: the process terminates rather than serving further commands
//! against possibly inconsistent shared state.
//!
//! Display strings double as the wire-level error messages, so they are
//! frozen for client compatibility. Note one inherited inconsistency:
//! `get_database` masks "exists but you are not an owner" behind
//! `DbNotExist` to avoid leaking database existence, while registration
//! still reveals username collisions via `UsernameAlreadyTaken`.

use thiserror::Error;

/// Result type alias using WardenError
pub type Result<T> = std::result::Result<T, WardenError>;

/// Unified error type for WardenKV operations
#[derive(Debug, Error)]
pub enum WardenError {
    // -------------------------------------------------------------------------
    // Dispatch / parse
    // -------------------------------------------------------------------------
    #[error("invalid command")]
    InvalidCommand,

    #[error("invalid number of parameters")]
    InvalidNumberOfParams,

    // -------------------------------------------------------------------------
    // Authentication / authorization
    // -------------------------------------------------------------------------
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("you must be logged in")]
    UserNotLoggedIn,

    #[error("unauthorized: only root may do this")]
    UserUnauthorized,

    #[error("cannot delete the root user")]
    CannotDeleteRootUser,

    // -------------------------------------------------------------------------
    // Store
    // -------------------------------------------------------------------------
    #[error("database does not exist")]
    DbNotExist,

    #[error("database already exist with the same name")]
    DbAlreadyExists,

    #[error("user does not exist")]
    UserNotExist,

    #[error("username already taken")]
    UsernameAlreadyTaken,

    // -------------------------------------------------------------------------
    // Database operations
    // -------------------------------------------------------------------------
    #[error("invalid key")]
    InvalidKey,

    #[error("no database selected")]
    NoDbSelected,

    #[error("invalid ttl: should be integer")]
    InvalidTtl,

    // -------------------------------------------------------------------------
    // Internal (fatal at the dispatch boundary)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl WardenError {
    /// Whether this error is part of the per-connection command taxonomy.
    ///
    /// Recoverable errors produce a response line and the connection loop
    /// continues; anything else must fail fast.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, WardenError::Io(_) | WardenError::Serialization(_))
    }
}
