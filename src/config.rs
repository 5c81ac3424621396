//! Configuration for WardenKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a WardenKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── users.json       (username -> hex credential, write-through)
    ///     ├── db_owners.json   (database -> owner list, write-through)
    ///     ├── user_dbs.json    (username -> owned databases, write-through)
    ///     ├── snapshot.bin     (database collection, checkpoint on shutdown)
    ///     └── commands.log     (write-ahead command log)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the command log
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Authentication Configuration
    // -------------------------------------------------------------------------
    /// Root username, provisioned at startup
    pub root_user: String,

    /// Root password, used only if the root user is not yet registered
    pub root_password: String,

    /// PBKDF2-HMAC-SHA256 iteration count.
    ///
    /// Hashing runs while the single command mutex is held, so every login
    /// and registration stalls all other connections for the duration of
    /// the derivation. Raising this hardens stored credentials at the cost
    /// of tail latency across the whole server.
    pub pbkdf2_iterations: u32,

    // -------------------------------------------------------------------------
    // Expiry Configuration
    // -------------------------------------------------------------------------
    /// Interval between expiry sweeps (milliseconds)
    pub sweep_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,
}

/// Command log sync strategy
#[derive(Debug, Clone, Copy)]
pub enum WalSyncStrategy {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced appends (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./wardenkv_data"),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            root_user: "root".to_string(),
            root_password: "rootpass".to_string(),
            pbkdf2_iterations: 10_000,
            sweep_interval_ms: 1_000,
            listen_addr: "127.0.0.1:7144".to_string(),
            max_connections: 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the command log sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the root username
    pub fn root_user(mut self, username: impl Into<String>) -> Self {
        self.config.root_user = username.into();
        self
    }

    /// Set the root password
    pub fn root_password(mut self, password: impl Into<String>) -> Self {
        self.config.root_password = password.into();
        self
    }

    /// Set the PBKDF2 iteration count
    pub fn pbkdf2_iterations(mut self, iterations: u32) -> Self {
        self.config.pbkdf2_iterations = iterations;
        self
    }

    /// Set the expiry sweep interval (in milliseconds)
    pub fn sweep_interval_ms(mut self, ms: u64) -> Self {
        self.config.sweep_interval_ms = ms;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
