//! Connection Handler
//!
//! Handles a single client connection: read a line, dispatch it under the
//! shared router lock, write the response line, flush, repeat.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::router::Router;
use crate::session::Session;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared single-writer router
    router: Arc<Mutex<Router>>,

    /// This connection's session state
    session: Session,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler.
    ///
    /// Failures here are socket-level and affect only this client.
    pub fn new(stream: TcpStream, router: Arc<Mutex<Router>>) -> std::io::Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            router,
            session: Session::new(),
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed).
    ///
    /// Socket errors close only this connection and return `Ok`. An `Err`
    /// from this method comes out of dispatch and is an internal failure;
    /// the caller must treat it as fatal to the process.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("connection established from {}", self.peer_addr);

        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    tracing::debug!("client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("read from {} failed: {}", self.peer_addr, e);
                    return Ok(());
                }
            }

            // Hold the lock for exactly one dispatched command: commands
            // from other connections interleave between lines, never
            // within one.
            let response = {
                let mut router = self.router.lock();
                router.dispatch(&mut self.session, line.trim_end())?
            };

            if let Err(e) = self.send_response(&response) {
                tracing::debug!(
                    "client {} went away before response could be sent: {}",
                    self.peer_addr,
                    e
                );
                return Ok(());
            }
        }
    }

    /// Write one response line and flush before reading the next command.
    fn send_response(&mut self, response: &str) -> std::io::Result<()> {
        self.writer.write_all(response.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
