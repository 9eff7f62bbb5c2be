//! Engine Module
//!
//! The storage engine: an in-memory map whose write path is the
//! append-only log.
//!
//! ## Responsibilities
//! - Serve get/set/delete against the in-memory map
//! - In live mode, durably append every mutation before applying it
//! - In recovering mode, apply replayed records without re-logging them

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::aof::{Aof, Record};
use crate::error::Result;
use crate::memtable::MemTable;
use crate::protocol::{Command, Response};

/// Whether mutations are logged before they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Append to the log, then apply in memory
    Live,

    /// Apply in memory only; used while replaying the log at startup
    Recovering,
}

/// The storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/delete): Serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Must acquire: write_lock → AOF append → memtable
///   - The order writes take `write_lock` is the order of records in the log,
///     so replaying the log reproduces the live map exactly
///
/// - **Reads** (get): No write_lock needed
///   - MemTable uses internal RwLock (many concurrent readers)
///   - A read observes every write that returned before it started
pub struct Engine {
    /// Log handle; `None` in recovering mode
    aof: Option<Arc<Aof>>,

    /// In-memory key/value map (internal RwLock)
    memtable: MemTable,

    /// Serializes write operations (set/delete/prime)
    write_lock: Mutex<()>,
}

impl Engine {
    /// Create an empty engine that logs every mutation to `aof`
    pub fn live(aof: Arc<Aof>) -> Self {
        Self {
            aof: Some(aof),
            memtable: MemTable::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create an empty engine that never touches the log
    pub fn recovering() -> Self {
        Self {
            aof: None,
            memtable: MemTable::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.aof.is_some() {
            Mode::Live
        } else {
            Mode::Recovering
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.memtable.get(key)
    }

    /// Set a key to a value
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Append SET record to the log (live mode only)
    /// 3. Write to MemTable
    ///
    /// If the append fails the map is left untouched.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        if let Some(aof) = &self.aof {
            aof.append(&Record::set(key, value))?;
        }
        self.memtable.put(key.to_vec(), value.to_vec());

        tracing::trace!(key_len = key.len(), value_len = value.len(), mode = ?self.mode(), "set");
        Ok(())
    }

    /// Delete a key
    ///
    /// Deleting an absent key is not an error and is still logged, so the
    /// log replays to the same end state.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        if let Some(aof) = &self.aof {
            aof.append(&Record::delete(key))?;
        }
        let existed = self.memtable.delete(key);

        tracing::trace!(key_len = key.len(), existed, mode = ?self.mode(), "delete");
        Ok(())
    }

    /// Apply a logged record
    pub fn apply(&self, record: &Record) -> Result<()> {
        match record {
            Record::Set { key, value } => self.set(key, value),
            Record::Delete { key } => self.delete(key),
        }
    }

    /// Execute a client command
    ///
    /// Routes commands to the matching operation and builds the response.
    pub fn execute(&self, command: Command) -> Result<Response> {
        match command {
            Command::Get { key } => Ok(Response::value(self.get(&key))),
            Command::Set { key, value } => {
                self.set(&key, &value)?;
                Ok(Response::ok(None))
            }
            Command::Delete { key } => {
                self.delete(&key)?;
                Ok(Response::ok(None))
            }
            Command::Ping => Ok(Response::pong()),
        }
    }

    /// Take over the final map of a recovered engine
    ///
    /// Nothing is logged: the entries already come from the log. Must run
    /// before the engine serves traffic.
    pub fn prime_from(&self, recovered: Engine) {
        let _write_guard = self.write_lock.lock();
        let entries = recovered.memtable.into_map();
        let count = entries.len();
        self.memtable.replace(entries);
        tracing::debug!(keys = count, "Primed engine from recovered state");
    }

    /// Drop every entry from memory without logging
    ///
    /// Only meaningful in recovering mode, where the map is rebuilt from the
    /// log from scratch.
    pub fn reset(&self) {
        let _write_guard = self.write_lock.lock();
        self.memtable.clear();
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.memtable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    /// Approximate bytes held by keys and values
    pub fn memory_size(&self) -> usize {
        self.memtable.size()
    }

    /// Copy of the whole map
    pub fn snapshot(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        self.memtable.snapshot()
    }

    /// The log this engine appends to, if live
    pub fn aof(&self) -> Option<&Arc<Aof>> {
        self.aof.as_ref()
    }
}
