//! # aofkv
//!
//! A single-node key-value server with:
//! - Append-only log (AOF) for durability, synced before every acknowledgment
//! - Crash recovery that tolerates a torn tail
//! - Single-writer/multi-reader storage engine
//! - TCP-based client protocol with graceful shutdown
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (one handler thread per client)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Storage Engine (live)                        │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     AOF     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └──────┬──────┘          └──────▲──────┘
//!          │   startup replay       │
//!          └────► Recovery ─────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod util;

pub mod aof;
pub mod memtable;
pub mod engine;
pub mod recovery;
pub mod protocol;
pub mod network;
pub mod client;
pub mod startup;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::{Engine, Mode};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of aofkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
