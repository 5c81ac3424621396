//! WardenKV CLI Client
//!
//! Interactive line-protocol client. The protocol is stateful (login,
//! database selection), so the client keeps one connection open and
//! forwards stdin lines as commands.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;

use clap::Parser;

/// WardenKV CLI
#[derive(Parser, Debug)]
#[command(name = "wardenkv-cli")]
#[command(about = "Interactive client for the WardenKV line protocol")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7144")]
    server: String,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = repl(&args.server) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn repl(addr: &str) -> io::Result<()> {
    let stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    let mut responses = BufReader::new(stream.try_clone()?);
    let mut commands = BufWriter::new(stream);

    println!("connected to {addr} (Ctrl+D to quit)");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        commands.write_all(line.as_bytes())?;
        commands.write_all(b"\n")?;
        commands.flush()?;

        let mut response = String::new();
        if responses.read_line(&mut response)? == 0 {
            eprintln!("server closed the connection");
            break;
        }
        print!("{response}");
    }

    Ok(())
}
