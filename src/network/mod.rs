//! Network Module
//!
//! TCP transport for the line protocol.
//!
//! ## Architecture
//! - Single acceptor loop polling a shutdown flag
//! - One thread per client connection
//! - Every dispatched command runs under one shared mutex (single writer)
//! - Background sweeper thread serialized through the same mutex

mod connection;
mod server;

pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
