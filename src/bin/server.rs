//! WardenKV Server Binary
//!
//! Starts the TCP server for WardenKV.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use wardenkv::network::Server;
use wardenkv::{Config, Router};

/// WardenKV Server
#[derive(Parser, Debug)]
#[command(name = "wardenkv-server")]
#[command(about = "Multi-tenant key-value store with TTLs and crash recovery")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./wardenkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7144")]
    listen: String,

    /// Root username
    #[arg(long, default_value = "root")]
    root_user: String,

    /// Root password (falls back to WARDENKV_ROOT_PASSWORD)
    #[arg(long)]
    root_password: Option<String>,

    /// PBKDF2-HMAC-SHA256 iteration count for password hashing
    #[arg(long, default_value = "10000")]
    pbkdf2_iterations: u32,

    /// Expiry sweep interval in milliseconds
    #[arg(long, default_value = "1000")]
    sweep_interval_ms: u64,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wardenkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let root_password = args
        .root_password
        .or_else(|| std::env::var("WARDENKV_ROOT_PASSWORD").ok());
    let Some(root_password) = root_password else {
        tracing::error!("no root password: pass --root-password or set WARDENKV_ROOT_PASSWORD");
        std::process::exit(2);
    };

    tracing::info!("WardenKV Server v{}", wardenkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .root_user(&args.root_user)
        .root_password(root_password)
        .pbkdf2_iterations(args.pbkdf2_iterations)
        .sweep_interval_ms(args.sweep_interval_ms)
        .max_connections(args.max_connections)
        .build();

    // Startup protocol: open store, replay the command log, stand up the
    // WAL writer.
    let router = match Router::open(&config) {
        Ok(router) => router,
        Err(e) => {
            tracing::error!("failed to open store: {e}");
            std::process::exit(1);
        }
    };

    let mut server = match Server::bind(&config, router) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("failed to bind {}: {e}", config.listen_addr);
            std::process::exit(1);
        }
    };

    // Graceful shutdown on Ctrl+C / SIGTERM: the run loop drains
    // connections and checkpoints before returning.
    let handle = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("shutdown signal received");
        handle.shutdown();
    }) {
        tracing::error!("failed to install signal handler: {e}");
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }

    tracing::info!("server stopped");
}
