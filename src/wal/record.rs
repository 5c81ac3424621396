//! Command log records
//!
//! The five mutating commands in their logged form, and the line codec
//! for the append-only log file.

use crate::error::{Result, WardenError};

/// A mutating command as it appears in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateDb {
        db: String,
    },
    DeleteDb {
        db: String,
    },
    Put {
        db: String,
        key: String,
        value: String,
        ttl: Option<u64>,
    },
    Update {
        db: String,
        key: String,
        value: String,
        ttl: Option<u64>,
    },
    Delete {
        db: String,
        key: String,
    },
}

impl Mutation {
    /// Wire command name, reused as the log token.
    pub fn command_name(&self) -> &'static str {
        match self {
            Mutation::CreateDb { .. } => "create_db",
            Mutation::DeleteDb { .. } => "delete_db",
            Mutation::Put { .. } => "put",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
        }
    }

    /// Name of the database this mutation targets.
    pub fn database(&self) -> &str {
        match self {
            Mutation::CreateDb { db }
            | Mutation::DeleteDb { db }
            | Mutation::Put { db, .. }
            | Mutation::Update { db, .. }
            | Mutation::Delete { db, .. } => db,
        }
    }
}

/// One line of the command log: a logical timestamp plus the mutation
/// executed at that time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Unix seconds at which the command originally executed
    pub timestamp: u64,

    /// The command itself
    pub mutation: Mutation,
}

impl LogRecord {
    pub fn new(timestamp: u64, mutation: Mutation) -> Self {
        Self {
            timestamp,
            mutation,
        }
    }

    /// Encode as one log line (no trailing newline).
    pub fn to_line(&self) -> String {
        let mutation = match &self.mutation {
            Mutation::CreateDb { db } | Mutation::DeleteDb { db } => {
                format!("{} {}", self.mutation.command_name(), db)
            }
            Mutation::Put {
                db,
                key,
                value,
                ttl,
            }
            | Mutation::Update {
                db,
                key,
                value,
                ttl,
            } => match ttl {
                Some(seconds) => format!(
                    "{} {} {} {} {}",
                    self.mutation.command_name(),
                    db,
                    key,
                    value,
                    seconds
                ),
                None => format!(
                    "{} {} {} {}",
                    self.mutation.command_name(),
                    db,
                    key,
                    value
                ),
            },
            Mutation::Delete { db, key } => {
                format!("{} {} {}", self.mutation.command_name(), db, key)
            }
        };
        format!("{}\t{}", self.timestamp, mutation)
    }

    /// Parse one log line.
    ///
    /// Malformed lines are a `Serialization` error; replay logs and skips
    /// them rather than aborting recovery.
    pub fn parse(line: &str) -> Result<Self> {
        let (stamp, command) = line
            .split_once('\t')
            .ok_or_else(|| WardenError::Serialization("log record missing timestamp".into()))?;
        let timestamp: u64 = stamp
            .parse()
            .map_err(|_| WardenError::Serialization(format!("bad log timestamp: {stamp}")))?;

        let fields: Vec<&str> = command.split_whitespace().collect();
        let mutation = match fields.as_slice() {
            ["create_db", db] => Mutation::CreateDb {
                db: (*db).to_string(),
            },
            ["delete_db", db] => Mutation::DeleteDb {
                db: (*db).to_string(),
            },
            ["put", db, key, value] => Mutation::Put {
                db: (*db).to_string(),
                key: (*key).to_string(),
                value: (*value).to_string(),
                ttl: None,
            },
            ["put", db, key, value, ttl] => Mutation::Put {
                db: (*db).to_string(),
                key: (*key).to_string(),
                value: (*value).to_string(),
                ttl: Some(parse_ttl(ttl)?),
            },
            ["update", db, key, value] => Mutation::Update {
                db: (*db).to_string(),
                key: (*key).to_string(),
                value: (*value).to_string(),
                ttl: None,
            },
            ["update", db, key, value, ttl] => Mutation::Update {
                db: (*db).to_string(),
                key: (*key).to_string(),
                value: (*value).to_string(),
                ttl: Some(parse_ttl(ttl)?),
            },
            ["delete", db, key] => Mutation::Delete {
                db: (*db).to_string(),
                key: (*key).to_string(),
            },
            _ => {
                return Err(WardenError::Serialization(format!(
                    "unrecognized log command: {command}"
                )))
            }
        };

        Ok(Self {
            timestamp,
            mutation,
        })
    }
}

fn parse_ttl(raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| WardenError::Serialization(format!("bad log ttl: {raw}")))
}
