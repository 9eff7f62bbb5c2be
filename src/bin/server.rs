//! aofkv Server Binary
//!
//! Starts the TCP server for aofkv.

use std::process::ExitCode;

use aofkv::{startup, Config};
use clap::Parser;
use crossbeam::channel;
use tracing_subscriber::{fmt, EnvFilter};

/// aofkv Server
#[derive(Parser, Debug)]
#[command(name = "aofkv-server")]
#[command(about = "Single-node key-value server backed by an append-only log")]
#[command(version)]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// Path of the append-only log file
    #[arg(short, long, default_value = "./aofkv_data/aof.log")]
    storage_file: String,

    /// Attempts for recovery and for binding the port
    #[arg(long, default_value = "5")]
    retry_attempts: u32,

    /// Delay before the first retry, in milliseconds (doubles each retry)
    #[arg(long, default_value = "300")]
    retry_delay_ms: u64,

    /// Deadline for log recovery, in milliseconds
    #[arg(long, default_value = "6000")]
    recovery_timeout_ms: u64,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,aofkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("aofkv Server v{}", aofkv::VERSION);
    tracing::info!("Storage file: {}", args.storage_file);
    tracing::info!("Port: {}", args.port);

    // Build config from args
    let config = Config::builder()
        .storage_file_path(&args.storage_file)
        .port(args.port)
        .retry_attempts(args.retry_attempts)
        .retry_base_delay_ms(args.retry_delay_ms)
        .recovery_timeout_ms(args.recovery_timeout_ms)
        .build();

    // Recover, then bind
    let server = match startup::start(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    // Set up Ctrl+C / SIGTERM handler feeding the shutdown watcher
    let (stop_tx, stop_rx) = channel::bounded::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    }) {
        tracing::error!(error = %e, "Failed to install signal handler");
        return ExitCode::FAILURE;
    }

    // Detached: it finishes on its own once the signal arrives
    if let Err(e) = server.coordinator().watch(stop_rx) {
        tracing::error!(error = %e, "Failed to start shutdown watcher");
        return ExitCode::FAILURE;
    }

    match server.run() {
        Ok(()) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
