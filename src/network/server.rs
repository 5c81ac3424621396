//! TCP Server
//!
//! Accepts connections and hands each one to a worker thread. The accept
//! loop runs non-blocking so it can poll the shutdown flag; a registry of
//! stream handles lets shutdown wake readers blocked mid-line. The expiry
//! sweeper runs on a crossbeam tick channel and takes the same router
//! mutex as command dispatch.

use std::collections::HashMap;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::network::Connection;
use crate::router::Router;

/// How often the accept loop polls the shutdown flag
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// TCP server for WardenKV
pub struct Server {
    listener: TcpListener,
    router: Arc<Mutex<Router>>,
    shutdown: Arc<AtomicBool>,
    sweep_interval: Duration,
    max_connections: usize,

    /// Live stream handles, keyed by connection id, so shutdown can wake
    /// blocked readers
    streams: Arc<Mutex<HashMap<u64, TcpStream>>>,
}

/// Cloneable handle that flips the server's shutdown flag.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    /// Ask the server to stop accepting, drain, and checkpoint.
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Server {
    /// Bind the listen address and take ownership of the router.
    pub fn bind(config: &Config, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            router: Arc::new(Mutex::new(router)),
            shutdown: Arc::new(AtomicBool::new(false)),
            sweep_interval: Duration::from_millis(config.sweep_interval_ms),
            max_connections: config.max_connections,
            streams: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// The actually-bound address (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for signal handlers and tests to request shutdown.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Serve until shutdown is requested, then drain and checkpoint.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("listening on {}", self.local_addr()?);

        let (sweeper_stop, sweeper) = self.spawn_sweeper();

        let active = Arc::new(AtomicUsize::new(0));
        let mut workers: Vec<thread::JoinHandle<()>> = Vec::new();
        let mut next_conn_id: u64 = 0;

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if active.load(Ordering::SeqCst) >= self.max_connections {
                        tracing::warn!("rejecting {addr}: connection limit reached");
                        let mut stream = stream;
                        let _ = stream.write_all(b"server busy\n");
                        continue;
                    }

                    // The accepted stream must block; only the listener
                    // polls.
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("failed to configure stream for {addr}: {e}");
                        continue;
                    }

                    let conn_id = next_conn_id;
                    next_conn_id += 1;
                    if let Ok(handle) = stream.try_clone() {
                        self.streams.lock().insert(conn_id, handle);
                    }

                    active.fetch_add(1, Ordering::SeqCst);
                    workers.push(self.spawn_worker(conn_id, stream, Arc::clone(&active)));
                    workers.retain(|worker| !worker.is_finished());
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    tracing::warn!("accept failed: {e}");
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        tracing::info!("shutdown requested, draining connections");

        // Wake any reader blocked on a half-finished line.
        for (_, stream) in self.streams.lock().iter() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        for worker in workers {
            let _ = worker.join();
        }

        drop(sweeper_stop);
        let _ = sweeper.join();

        self.router.lock().checkpoint()?;
        tracing::info!("graceful shutdown: ok");
        Ok(())
    }

    /// Background expiry sweeper, serialized with dispatch through the
    /// router mutex.
    fn spawn_sweeper(&self) -> (channel::Sender<()>, thread::JoinHandle<()>) {
        let (stop_tx, stop_rx) = channel::unbounded::<()>();
        let router = Arc::clone(&self.router);
        let ticker = channel::tick(self.sweep_interval);

        let handle = thread::spawn(move || loop {
            channel::select! {
                recv(ticker) -> _ => {
                    let purged = router.lock().sweep_expired();
                    if purged > 0 {
                        tracing::debug!("expiry sweep purged {purged} key(s)");
                    }
                }
                recv(stop_rx) -> _ => return,
            }
        });

        (stop_tx, handle)
    }

    fn spawn_worker(
        &self,
        conn_id: u64,
        stream: TcpStream,
        active: Arc<AtomicUsize>,
    ) -> thread::JoinHandle<()> {
        let router = Arc::clone(&self.router);
        let streams = Arc::clone(&self.streams);

        thread::spawn(move || {
            match Connection::new(stream, router) {
                Ok(mut connection) => {
                    if let Err(e) = connection.handle() {
                        // Internal failure: the shared state can no longer
                        // be trusted, so fail fast instead of serving more
                        // commands.
                        tracing::error!(
                            "fatal internal error on connection {}: {e}",
                            connection.peer_addr()
                        );
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to set up connection: {e}");
                }
            }
            streams.lock().remove(&conn_id);
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }
}
