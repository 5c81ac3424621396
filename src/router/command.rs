//! Command definitions
//!
//! The fixed set of wire commands, each carrying its handler pipeline as
//! a compile-time list of function references. Unknown input is the only
//! way to fail resolution; a known command can never miss its pipeline.

use crate::error::{Result, WardenError};
use crate::router::handlers;
use crate::router::Handler;
use crate::session::Session;
use crate::wal::Mutation;

/// Commands may carry at most this many parameters.
pub const MAX_PARAMS: usize = 4;

/// Command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    // User commands
    Login,
    Whoami,
    RegisterUser,
    DeleteUser,
    AddUserToOwners,
    // Database commands
    CreateDb,
    SelectDb,
    CurrentDb,
    DeleteDb,
    ListUsers,
    ListDbs,
    // Entity commands
    Get,
    Put,
    Update,
    Delete,
}

impl CommandKind {
    /// Resolve a wire command name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "login" => Some(CommandKind::Login),
            "whoami" => Some(CommandKind::Whoami),
            "register_user" => Some(CommandKind::RegisterUser),
            "delete_user" => Some(CommandKind::DeleteUser),
            "add_user_to_owners" => Some(CommandKind::AddUserToOwners),
            "create_db" => Some(CommandKind::CreateDb),
            "select_db" => Some(CommandKind::SelectDb),
            "current_db" => Some(CommandKind::CurrentDb),
            "delete_db" => Some(CommandKind::DeleteDb),
            "list_users" => Some(CommandKind::ListUsers),
            "list_dbs" => Some(CommandKind::ListDbs),
            "get" => Some(CommandKind::Get),
            "put" => Some(CommandKind::Put),
            "update" => Some(CommandKind::Update),
            "delete" => Some(CommandKind::Delete),
            _ => None,
        }
    }

    /// The ordered handler pipeline for this command.
    ///
    /// Cross-cutting preconditions compose ahead of the action handler:
    /// `whoami` requires a login, `current_db` a selected database,
    /// `require_root` the root user. The last handler's response wins.
    pub fn pipeline(self) -> &'static [Handler] {
        match self {
            CommandKind::Login => &[handlers::login],
            CommandKind::Whoami => &[handlers::whoami],
            CommandKind::RegisterUser => &[handlers::register_user],
            CommandKind::DeleteUser => &[
                handlers::whoami,
                handlers::require_root,
                handlers::delete_user,
            ],
            CommandKind::AddUserToOwners => &[
                handlers::whoami,
                handlers::require_root,
                handlers::add_user_to_owners,
            ],
            CommandKind::CreateDb => &[handlers::whoami, handlers::create_db],
            CommandKind::SelectDb => &[handlers::whoami, handlers::select_db],
            CommandKind::CurrentDb => &[handlers::whoami, handlers::current_db],
            CommandKind::DeleteDb => &[handlers::whoami, handlers::delete_db],
            CommandKind::ListUsers => &[
                handlers::whoami,
                handlers::current_db,
                handlers::list_users,
            ],
            CommandKind::ListDbs => &[handlers::whoami, handlers::list_dbs],
            CommandKind::Get => &[handlers::whoami, handlers::current_db, handlers::get],
            CommandKind::Put => &[handlers::whoami, handlers::current_db, handlers::put],
            CommandKind::Update => &[handlers::whoami, handlers::current_db, handlers::update],
            CommandKind::Delete => &[handlers::whoami, handlers::current_db, handlers::delete],
        }
    }

    /// Whether a successful execution must be appended to the command
    /// log. User and ownership changes are write-through persisted and
    /// never logged.
    pub fn is_logged(self) -> bool {
        matches!(
            self,
            CommandKind::CreateDb
                | CommandKind::DeleteDb
                | CommandKind::Put
                | CommandKind::Update
                | CommandKind::Delete
        )
    }

    /// Project the executed command into its logged form.
    ///
    /// Called only after the pipeline succeeded, so the params have
    /// already been validated by the action handler.
    pub fn mutation(self, session: &Session) -> Option<Mutation> {
        let params = &session.params;
        match self {
            CommandKind::CreateDb => Some(Mutation::CreateDb {
                db: params.first()?.clone(),
            }),
            CommandKind::DeleteDb => Some(Mutation::DeleteDb {
                db: params.first()?.clone(),
            }),
            CommandKind::Put => Some(Mutation::Put {
                db: session.database_name.clone(),
                key: params.first()?.clone(),
                value: params.get(1)?.clone(),
                ttl: params.get(2).and_then(|raw| raw.parse().ok()),
            }),
            CommandKind::Update => Some(Mutation::Update {
                db: session.database_name.clone(),
                key: params.first()?.clone(),
                value: params.get(1)?.clone(),
                ttl: params.get(2).and_then(|raw| raw.parse().ok()),
            }),
            CommandKind::Delete => Some(Mutation::Delete {
                db: session.database_name.clone(),
                key: params.first()?.clone(),
            }),
            _ => None,
        }
    }
}

/// Split an input line into a command kind and its parameters.
///
/// Whitespace-separated; an empty line, an unknown command name, or more
/// than `MAX_PARAMS` parameters all fail with `InvalidCommand`.
pub fn parse_line(line: &str) -> Result<(CommandKind, Vec<String>)> {
    let mut fields = line.split_whitespace();
    let name = fields.next().ok_or(WardenError::InvalidCommand)?;
    let kind = CommandKind::parse(name).ok_or(WardenError::InvalidCommand)?;
    let params: Vec<String> = fields.map(str::to_string).collect();
    if params.len() > MAX_PARAMS {
        return Err(WardenError::InvalidCommand);
    }
    Ok((kind, params))
}
