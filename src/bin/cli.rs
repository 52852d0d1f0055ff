//! PolarKV CLI
//!
//! Interactive console over a local data directory.

use std::io::{self, BufRead, Write};

use clap::Parser;
use polarkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// PolarKV CLI
#[derive(Parser, Debug)]
#[command(name = "polarkv-cli")]
#[command(about = "Interactive console for a PolarKV data directory")]
#[command(version)]
struct Args {
    /// Data directory (created if missing)
    #[arg(short, long, default_value = "./polarkv_data")]
    data_dir: String,

    /// MemTable size in bytes that triggers a flush
    #[arg(short, long, default_value = "4194304")]
    flush_threshold: u64,

    /// Maximum number of records printed by `scan`
    #[arg(long, default_value = "100")]
    scan_limit: usize,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,polarkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = std::fs::create_dir_all(&args.data_dir) {
        tracing::error!("Can't create data directory {}: {}", args.data_dir, e);
        std::process::exit(1);
    }

    tracing::info!("PolarKV CLI v{}", polarkv::VERSION);
    tracing::info!("Storing data in {}", args.data_dir);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .flush_threshold_bytes(args.flush_threshold)
        .build();

    let engine = match Engine::open(config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    println!("Supported commands:");
    println!("\tget <key>");
    println!("\tput <key> <value>");
    println!("\tremove <key>");
    println!("\tscan [<from>]");
    println!("\tquit");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            ["quit"] => break,
            ["get", key] => match engine.get(key.as_bytes()) {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("absent"),
            },
            ["put", key, value] => report(engine.upsert(key.as_bytes(), value.as_bytes())),
            ["remove", key] => report(engine.remove(key.as_bytes())),
            ["scan"] => scan(&engine, b"", args.scan_limit),
            ["scan", from] => scan(&engine, from.as_bytes(), args.scan_limit),
            [cmd, ..] => tracing::error!("Unsupported command or arguments: {}", cmd),
        }
        let _ = io::stdout().flush();
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close engine: {}", e);
        // exit skips destructors; let Drop make its last flush attempt first
        drop(engine);
        std::process::exit(1);
    }
}

fn report(result: polarkv::Result<()>) {
    match result {
        Ok(()) => println!("ok"),
        Err(e) => tracing::error!("Write failed: {}", e),
    }
}

fn scan(engine: &Engine, from: &[u8], limit: usize) {
    for record in engine.iter_from(from).take(limit) {
        println!(
            "{} = {}",
            String::from_utf8_lossy(&record.key),
            String::from_utf8_lossy(&record.value)
        );
    }
}
