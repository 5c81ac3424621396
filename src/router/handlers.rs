//! Command handlers
//!
//! One function per operation, composed into pipelines by
//! [`CommandKind::pipeline`](crate::router::CommandKind::pipeline).
//! Precondition handlers double as responses where the original protocol
//! says so: `whoami` both requires a login and echoes the username,
//! `current_db` both requires a selection and echoes the database name.

use crate::error::{Result, WardenError};
use crate::session::Session;
use crate::store::Store;
use crate::wal::Mutation;

// =============================================================================
// Preconditions
// =============================================================================

/// Require a logged-in session; echo the username.
pub fn whoami(session: &mut Session, _store: &mut Store) -> Result<String> {
    if !session.is_logged_in() {
        return Err(WardenError::UserNotLoggedIn);
    }
    Ok(session.username.clone())
}

/// Require a selected database; echo its name.
pub fn current_db(session: &mut Session, _store: &mut Store) -> Result<String> {
    if !session.has_database() {
        return Err(WardenError::NoDbSelected);
    }
    Ok(session.database_name.clone())
}

/// Require the root user.
pub fn require_root(session: &mut Session, store: &mut Store) -> Result<String> {
    if session.username != store.root_user() {
        return Err(WardenError::UserUnauthorized);
    }
    Ok(session.username.clone())
}

// =============================================================================
// User commands
// =============================================================================

pub fn login(session: &mut Session, store: &mut Store) -> Result<String> {
    let [username, password] = take_params::<2>(session)?;
    if username.is_empty() || password.is_empty() || !store.authenticate_user(&username, &password)
    {
        return Err(WardenError::InvalidCredentials);
    }
    session.username = username;
    session.clear_selection();
    Ok("login: ok".to_string())
}

pub fn register_user(session: &mut Session, store: &mut Store) -> Result<String> {
    let [username, password] = take_params::<2>(session)?;
    store.create_user(&username, &password)?;
    Ok("create_user: ok".to_string())
}

pub fn delete_user(session: &mut Session, store: &mut Store) -> Result<String> {
    let [username] = take_params::<1>(session)?;
    if username == store.root_user() {
        return Err(WardenError::CannotDeleteRootUser);
    }
    store.delete_user(&username)?;
    Ok("delete_user: ok".to_string())
}

pub fn add_user_to_owners(session: &mut Session, store: &mut Store) -> Result<String> {
    let [username, db_name] = take_params::<2>(session)?;
    store.add_user_to_owners(&username, &db_name)?;
    Ok("add_user_to_owners: ok".to_string())
}

// =============================================================================
// Database commands
// =============================================================================

pub fn create_db(session: &mut Session, store: &mut Store) -> Result<String> {
    let [name] = take_params::<1>(session)?;
    store.create_database(&session.username, &name)?;
    Ok("create_db: ok".to_string())
}

pub fn select_db(session: &mut Session, store: &mut Store) -> Result<String> {
    let [name] = take_params::<1>(session)?;
    store.get_database(&session.username, &name)?;
    session.database_name = name;
    Ok("select_db: ok".to_string())
}

pub fn delete_db(session: &mut Session, store: &mut Store) -> Result<String> {
    let [name] = take_params::<1>(session)?;
    store.delete_database(&session.username, &name)?;
    Ok("delete_db: ok".to_string())
}

pub fn list_users(session: &mut Session, store: &mut Store) -> Result<String> {
    let owners = store.list_users_of_db(&session.database_name)?;
    Ok(format!("{owners:?}"))
}

pub fn list_dbs(session: &mut Session, store: &mut Store) -> Result<String> {
    let owned = store.list_dbs_of_user(&session.username)?;
    Ok(format!("{owned:?}"))
}

// =============================================================================
// Entity commands
// =============================================================================

pub fn get(session: &mut Session, store: &mut Store) -> Result<String> {
    let [key] = take_params::<1>(session)?;
    let database = store.get_database(&session.username, &session.database_name)?;
    Ok(database.get(&key)?.to_string())
}

pub fn put(session: &mut Session, store: &mut Store) -> Result<String> {
    let (key, value, ttl) = take_kv_params(session)?;
    store.apply(
        &session.username,
        &Mutation::Put {
            db: session.database_name.clone(),
            key,
            value,
            ttl,
        },
    )?;
    Ok("put: ok".to_string())
}

pub fn update(session: &mut Session, store: &mut Store) -> Result<String> {
    let (key, value, ttl) = take_kv_params(session)?;
    store.apply(
        &session.username,
        &Mutation::Update {
            db: session.database_name.clone(),
            key,
            value,
            ttl,
        },
    )?;
    Ok("update: ok".to_string())
}

pub fn delete(session: &mut Session, store: &mut Store) -> Result<String> {
    let [key] = take_params::<1>(session)?;
    store.apply(
        &session.username,
        &Mutation::Delete {
            db: session.database_name.clone(),
            key,
        },
    )?;
    Ok("delete: ok".to_string())
}

// =============================================================================
// Param helpers
// =============================================================================

/// Destructure exactly N parameters or fail.
fn take_params<const N: usize>(session: &Session) -> Result<[String; N]> {
    <[String; N]>::try_from(session.params.clone())
        .map_err(|_| WardenError::InvalidNumberOfParams)
}

/// Destructure `key value [ttl]`, parsing the TTL before any mutation can
/// happen so a malformed TTL leaves the store untouched.
fn take_kv_params(session: &Session) -> Result<(String, String, Option<u64>)> {
    match session.params.as_slice() {
        [key, value] => Ok((key.clone(), value.clone(), None)),
        [key, value, ttl] => {
            let seconds: u64 = ttl.parse().map_err(|_| WardenError::InvalidTtl)?;
            Ok((key.clone(), value.clone(), Some(seconds)))
        }
        _ => Err(WardenError::InvalidNumberOfParams),
    }
}
