//! Write-Ahead Command Log Module
//!
//! Durability for everything not yet captured in the snapshot.
//!
//! ## Responsibilities
//! - Append one record per successful mutating command
//! - Replay the log against the store on startup
//! - Recompute time-relative TTL state during replay via the frozen clock
//!
//! ## File Format
//! One record per line, logical timestamp tab-separated from the command
//! text, command fields space-separated:
//! ```text
//! 1719250000<TAB>create_db mydb
//! 1719250003<TAB>put mydb session42 alice 30
//! 1719250007<TAB>delete mydb session42
//! ```

mod record;
mod recovery;
mod writer;

pub use record::{LogRecord, Mutation};
pub use recovery::{replay, RecoveryResult};
pub use writer::LogWriter;
