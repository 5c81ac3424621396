//! Store Module
//!
//! The server-wide collection of users, databases, and the ownership
//! relation between them.
//!
//! ## Responsibilities
//! - User registration and credential verification
//! - Database lifecycle and the bidirectional ownership indices
//! - Root user provisioning and its implicit ownership of every database
//! - TTL sweeps across the database collection
//! - Durable state: write-through maps, the snapshot, and `apply` as the
//!   single mutation entry point shared by live dispatch and log replay
//!
//! ## Ownership invariant
//! For every user `u` and database `d`:
//! `u ∈ owners_of(d) ⟺ d ∈ databases_of(u)`.
//! Both indices are updated within one dispatched command, and the
//! single-writer discipline means no torn update is ever observable.

mod database;
mod persistent;
pub mod snapshot;

pub use database::Database;
pub use persistent::PersistentMap;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::auth::PasswordCredential;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Result, WardenError};
use crate::wal::Mutation;

/// Server-wide state: databases, users, and ownership.
pub struct Store {
    data_dir: PathBuf,

    /// Distinguished username, implicit owner of every database
    root_user: String,

    /// PBKDF2 iteration count for hashing and verification
    pbkdf2_iterations: u32,

    /// Time source for all TTL math (frozen during log replay)
    clock: Clock,

    /// database name -> contents (snapshotted at checkpoint)
    dbs: HashMap<String, Database>,

    /// username -> hex credential (write-through)
    users: PersistentMap<String>,

    /// database name -> owner usernames (write-through)
    db_owners: PersistentMap<Vec<String>>,

    /// username -> owned database names (write-through)
    user_dbs: PersistentMap<Vec<String>>,
}

impl Store {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const USERS_FILENAME: &'static str = "users.json";
    const DB_OWNERS_FILENAME: &'static str = "db_owners.json";
    const USER_DBS_FILENAME: &'static str = "user_dbs.json";
    const SNAPSHOT_FILENAME: &'static str = "snapshot.bin";
    const COMMAND_LOG_FILENAME: &'static str = "commands.log";

    /// Open the store under `config.data_dir`.
    ///
    /// Creates the data directory, opens the write-through maps, loads the
    /// snapshot if one exists, and provisions the root user if it is not
    /// already registered. Command log replay is the router's job and
    /// happens after this returns.
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let users = PersistentMap::open(config.data_dir.join(Self::USERS_FILENAME))?;
        let db_owners = PersistentMap::open(config.data_dir.join(Self::DB_OWNERS_FILENAME))?;
        let user_dbs = PersistentMap::open(config.data_dir.join(Self::USER_DBS_FILENAME))?;

        let snapshot_path = config.data_dir.join(Self::SNAPSHOT_FILENAME);
        let dbs = match snapshot::load(&snapshot_path)? {
            Some(dbs) => {
                tracing::info!("loaded snapshot with {} database(s)", dbs.len());
                dbs
            }
            None => {
                tracing::info!("no snapshot found, starting empty");
                HashMap::new()
            }
        };

        let mut store = Self {
            data_dir: config.data_dir.clone(),
            root_user: config.root_user.clone(),
            pbkdf2_iterations: config.pbkdf2_iterations,
            clock: Clock::new(),
            dbs,
            users,
            db_owners,
            user_dbs,
        };

        if store.users.contains(&store.root_user) {
            tracing::info!("root user was already registered");
        } else {
            let root = store.root_user.clone();
            let password = config.root_password.clone();
            store.create_user(&root, &password)?;
            tracing::info!("registered root user from config");
        }

        Ok(store)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Register a new user with a freshly salted credential.
    pub fn create_user(&mut self, username: &str, password: &str) -> Result<()> {
        if self.users.contains(username) {
            return Err(WardenError::UsernameAlreadyTaken);
        }
        let credential = PasswordCredential::derive(password, self.pbkdf2_iterations);
        self.users.insert(username.to_string(), credential.to_hex())?;
        self.user_dbs.insert(username.to_string(), Vec::new())?;
        Ok(())
    }

    /// Verify a username/password pair.
    ///
    /// An unknown username is a normal negative result, not an error, so
    /// the caller's error path does not leak which usernames exist.
    pub fn authenticate_user(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.users.get(username) else {
            return false;
        };
        match PasswordCredential::from_hex(stored) {
            Ok(credential) => credential.verify(password, self.pbkdf2_iterations),
            Err(e) => {
                tracing::warn!("stored credential for {username} is unreadable: {e}");
                false
            }
        }
    }

    /// Delete a user and purge it from every owner index. Idempotent:
    /// deleting an unknown user is a no-op.
    pub fn delete_user(&mut self, username: &str) -> Result<()> {
        if !self.users.contains(username) {
            return Ok(());
        }
        self.users.remove(username)?;
        let owned = self.user_dbs.remove(username)?.unwrap_or_default();
        for db_name in owned {
            if let Some(mut owners) = self.db_owners.get(&db_name).cloned() {
                owners.retain(|owner| owner != username);
                self.db_owners.insert(db_name, owners)?;
            }
        }
        Ok(())
    }

    pub fn user_exists(&self, username: &str) -> bool {
        self.users.contains(username)
    }

    // =========================================================================
    // Databases and ownership
    // =========================================================================

    /// Create a database owned by `username` and by root.
    ///
    /// If the persistent owner index already holds an entry for this name,
    /// that entry is kept: log replay recreates databases whose ownership
    /// survived in the write-through index.
    pub fn create_database(&mut self, username: &str, name: &str) -> Result<()> {
        if self.dbs.contains_key(name) {
            return Err(WardenError::DbAlreadyExists);
        }
        if !self.users.contains(username) {
            return Err(WardenError::UserNotExist);
        }
        self.dbs.insert(name.to_string(), Database::new());
        if !self.db_owners.contains(name) {
            self.db_owners.insert(name.to_string(), Vec::new())?;
        }
        self.add_user_to_owners(username, name)?;
        let root = self.root_user.clone();
        self.add_user_to_owners(&root, name)?;
        Ok(())
    }

    /// Add `username` to the owners of `db_name`, updating both indices.
    /// Idempotent if already an owner.
    pub fn add_user_to_owners(&mut self, username: &str, db_name: &str) -> Result<()> {
        if !self.users.contains(username) {
            return Err(WardenError::UserNotExist);
        }
        let mut owners = match self.db_owners.get(db_name) {
            Some(owners) => owners.clone(),
            None => return Err(WardenError::DbNotExist),
        };
        if owners.iter().any(|owner| owner == username) {
            return Ok(());
        }
        owners.push(username.to_string());
        self.db_owners.insert(db_name.to_string(), owners)?;

        let mut owned = self.user_dbs.get(username).cloned().unwrap_or_default();
        owned.push(db_name.to_string());
        self.user_dbs.insert(username.to_string(), owned)?;
        Ok(())
    }

    /// Delete a database if `username` is an owner; purge it from every
    /// owner's index. Idempotent no-op when the database is absent or the
    /// caller is not an owner.
    pub fn delete_database(&mut self, username: &str, name: &str) -> Result<()> {
        if !self.dbs.contains_key(name) || !self.is_owner(username, name) {
            return Ok(());
        }
        self.dbs.remove(name);
        let owners = self.db_owners.remove(name)?.unwrap_or_default();
        for owner in owners {
            if let Some(mut owned) = self.user_dbs.get(&owner).cloned() {
                owned.retain(|db| db != name);
                self.user_dbs.insert(owner, owned)?;
            }
        }
        Ok(())
    }

    /// Look up a database, visible only to its owners.
    ///
    /// "Does not exist" and "exists but you are not an owner" are the same
    /// error on purpose: the response must not reveal which names exist.
    pub fn get_database(&self, username: &str, name: &str) -> Result<&Database> {
        if !self.is_owner(username, name) {
            return Err(WardenError::DbNotExist);
        }
        self.dbs.get(name).ok_or(WardenError::DbNotExist)
    }

    /// Mutable variant of [`get_database`](Self::get_database), same
    /// masking.
    pub fn get_database_mut(&mut self, username: &str, name: &str) -> Result<&mut Database> {
        if !self.is_owner(username, name) {
            return Err(WardenError::DbNotExist);
        }
        self.dbs.get_mut(name).ok_or(WardenError::DbNotExist)
    }

    /// Owners of a database.
    pub fn list_users_of_db(&self, name: &str) -> Result<Vec<String>> {
        if !self.dbs.contains_key(name) {
            return Err(WardenError::DbNotExist);
        }
        Ok(self.db_owners.get(name).cloned().unwrap_or_default())
    }

    /// Databases owned by a user.
    pub fn list_dbs_of_user(&self, username: &str) -> Result<Vec<String>> {
        if !self.users.contains(username) {
            return Err(WardenError::UserNotExist);
        }
        Ok(self.user_dbs.get(username).cloned().unwrap_or_default())
    }

    pub fn database_names(&self) -> Vec<String> {
        self.dbs.keys().cloned().collect()
    }

    /// Root passes every ownership check, independent of the owner lists:
    /// replay must be able to act on databases whose write-through index
    /// already reflects later commands.
    fn is_owner(&self, username: &str, db_name: &str) -> bool {
        if username == self.root_user {
            return true;
        }
        self.db_owners
            .get(db_name)
            .map_or(false, |owners| owners.iter().any(|owner| owner == username))
    }

    // =========================================================================
    // Mutations (shared by live dispatch and log replay)
    // =========================================================================

    /// Apply one logged mutation on behalf of `username`.
    ///
    /// This is the only code path for the five write-ahead-logged
    /// commands. Replay calls it as the root user with the clock frozen to
    /// the record's timestamp, so replayed TTLs land on the same absolute
    /// expiry the live execution produced.
    pub fn apply(&mut self, username: &str, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::CreateDb { db } => self.create_database(username, db),
            Mutation::DeleteDb { db } => self.delete_database(username, db),
            Mutation::Put {
                db,
                key,
                value,
                ttl,
            } => {
                let now = self.clock.now();
                let database = self.get_database_mut(username, db)?;
                database.put(key.clone(), value.clone());
                match ttl {
                    Some(seconds) => database.set_ttl(key, *seconds, now),
                    None => database.remove_ttl(key),
                }
                Ok(())
            }
            Mutation::Update {
                db,
                key,
                value,
                ttl,
            } => {
                let now = self.clock.now();
                let database = self.get_database_mut(username, db)?;
                database.update(key, value.clone())?;
                match ttl {
                    Some(seconds) => database.set_ttl(key, *seconds, now),
                    None => database.remove_ttl(key),
                }
                Ok(())
            }
            Mutation::Delete { db, key } => {
                let database = self.get_database_mut(username, db)?;
                database.delete(key);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Expiry
    // =========================================================================

    /// Run one expiry sweep across every database at the clock's current
    /// time. Returns the total number of keys purged.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now();
        self.dbs
            .values_mut()
            .map(|db| db.sweep_expired(now))
            .sum()
    }

    // =========================================================================
    // Durability
    // =========================================================================

    /// Write the database collection to the snapshot file.
    pub fn save_snapshot(&self) -> Result<()> {
        snapshot::save(&self.snapshot_path(), &self.dbs)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(Self::SNAPSHOT_FILENAME)
    }

    pub fn command_log_path(&self) -> PathBuf {
        self.data_dir.join(Self::COMMAND_LOG_FILENAME)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn root_user(&self) -> &str {
        &self.root_user
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}
