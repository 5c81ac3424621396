//! End-to-end tests over TCP
//!
//! These tests verify:
//! - The wire protocol against a live server
//! - Per-connection session isolation
//! - Graceful shutdown draining and checkpointing

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::thread;

use tempfile::TempDir;
use wardenkv::network::{Server, ShutdownHandle};
use wardenkv::{Config, Router};

// =============================================================================
// Helper Functions
// =============================================================================

struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        Self {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: BufWriter::new(stream),
        }
    }

    fn send(&mut self, line: &str) -> String {
        self.writer.write_all(line.as_bytes()).unwrap();
        self.writer.write_all(b"\n").unwrap();
        self.writer.flush().unwrap();

        let mut response = String::new();
        self.reader.read_line(&mut response).unwrap();
        response.trim_end().to_string()
    }
}

/// Bind a server on an ephemeral port and run it on a background thread.
fn start_server(dir: &TempDir) -> (String, ShutdownHandle, thread::JoinHandle<()>) {
    let config = Config::builder()
        .data_dir(dir.path())
        .listen_addr("127.0.0.1:0")
        .root_user("root")
        .root_password("rootpass")
        .pbkdf2_iterations(10)
        .sweep_interval_ms(50)
        .build();

    let router = Router::open(&config).unwrap();
    let mut server = Server::bind(&config, router).unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let handle = server.shutdown_handle();
    let join = thread::spawn(move || server.run().unwrap());
    (addr, handle, join)
}

// =============================================================================
// Wire Scenarios
// =============================================================================

#[test]
fn test_full_session_over_tcp() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown, join) = start_server(&dir);

    let mut client = Client::connect(&addr);
    assert_eq!(client.send("login root rootpass"), "login: ok");
    assert_eq!(client.send("create_db mydb"), "create_db: ok");
    assert_eq!(client.send("select_db mydb"), "select_db: ok");
    assert_eq!(client.send("put x 1"), "put: ok");
    assert_eq!(client.send("get x"), "1");
    assert_eq!(client.send("delete x"), "delete: ok");
    assert_eq!(client.send("get x"), "invalid key");
    drop(client);

    shutdown.shutdown();
    join.join().unwrap();
}

#[test]
fn test_sessions_are_isolated_per_connection() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown, join) = start_server(&dir);

    let mut root = Client::connect(&addr);
    assert_eq!(root.send("login root rootpass"), "login: ok");
    assert_eq!(root.send("create_db mydb"), "create_db: ok");

    // a second connection starts logged out, and cannot see root's db
    let mut alice = Client::connect(&addr);
    assert_eq!(alice.send("whoami"), "you must be logged in");
    assert_eq!(alice.send("register_user alice pw"), "create_user: ok");
    assert_eq!(alice.send("login alice pw"), "login: ok");
    assert_eq!(alice.send("select_db mydb"), "database does not exist");

    // root's own session is untouched
    assert_eq!(root.send("whoami"), "root");
    drop(root);
    drop(alice);

    shutdown.shutdown();
    join.join().unwrap();
}

#[test]
fn test_graceful_shutdown_checkpoints() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown, join) = start_server(&dir);

    let mut client = Client::connect(&addr);
    client.send("login root rootpass");
    client.send("create_db mydb");
    client.send("select_db mydb");
    client.send("put x 1");
    drop(client);

    shutdown.shutdown();
    join.join().unwrap();

    // the checkpoint captured the state and consumed the log
    assert!(dir.path().join("snapshot.bin").exists());
    assert!(!dir.path().join("commands.log").exists());

    // a fresh server over the same directory serves the data back
    let (addr, shutdown, join) = start_server(&dir);
    let mut client = Client::connect(&addr);
    client.send("login root rootpass");
    assert_eq!(client.send("select_db mydb"), "select_db: ok");
    assert_eq!(client.send("get x"), "1");
    drop(client);

    shutdown.shutdown();
    join.join().unwrap();
}

#[test]
fn test_expiry_sweeper_runs_in_background() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown, join) = start_server(&dir);

    let mut client = Client::connect(&addr);
    client.send("login root rootpass");
    client.send("create_db mydb");
    client.send("select_db mydb");
    assert_eq!(client.send("put gone v 0"), "put: ok");

    // ttl 0 expires immediately; the 50ms sweeper will purge it
    let mut purged = false;
    for _ in 0..50 {
        thread::sleep(std::time::Duration::from_millis(20));
        if client.send("get gone") == "invalid key" {
            purged = true;
            break;
        }
    }
    assert!(purged, "sweeper never purged the expired key");
    drop(client);

    shutdown.shutdown();
    join.join().unwrap();
}
