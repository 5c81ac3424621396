//! # WardenKV
//!
//! A multi-tenant key-value store server with:
//! - Per-user database ownership and authentication
//! - Per-key TTL expiry with a periodic sweep
//! - Write-ahead command logging and deterministic crash recovery
//! - Line-oriented TCP protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (one thread per client connection)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one line in, one line out
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Router                                 │
//! │     (command pipelines, single writer behind one mutex)      │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!     ┌─────────────┐               ┌──────────────┐
//!     │    Store    │               │  Command log │
//!     │ users/owners│               │   (append)   │
//!     │  databases  │               └──────────────┘
//!     └──────┬──────┘
//!            │
//!            ▼
//!     ┌─────────────┐
//!     │  Snapshot + │
//!     │  JSON maps  │
//!     └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod clock;
pub mod auth;
pub mod store;
pub mod session;
pub mod wal;
pub mod router;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, WardenError};
pub use config::Config;
pub use router::Router;
pub use session::Session;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of WardenKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
