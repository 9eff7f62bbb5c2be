//! aofkv CLI Client
//!
//! Command-line interface for interacting with aofkv.

use std::process::ExitCode;

use aofkv::Client;
use clap::{Parser, Subcommand};

/// aofkv CLI
#[derive(Parser, Debug)]
#[command(name = "aofkv-cli")]
#[command(about = "CLI for the aofkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Ping the server
    Ping,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Commands::Get { key } => client.get(key.as_bytes()).map(|value| match value {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(nil)"),
        }),
        Commands::Set { key, value } => client
            .set(key.as_bytes(), value.as_bytes())
            .map(|()| println!("OK")),
        Commands::Del { key } => client.delete(key.as_bytes()).map(|()| println!("OK")),
        Commands::Ping => client.ping().map(|()| println!("PONG")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
