//! Append-Only Log (AOF) Module
//!
//! Durable, ordered record of every mutation. The log is the single source
//! of truth: the in-memory map is always rebuilt from it on startup.
//!
//! ## Responsibilities
//! - Append records, syncing each one before acknowledging it
//! - Serialize concurrent appends (single writer)
//! - Read records back in order, dropping a torn tail left by a crash
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────┐
//! │ Record 1                            │
//! │ ┌─────────┬─────────┬─────────────┐ │
//! │ │ CRC (4) │ Len (4) │ Payload     │ │
//! │ └─────────┴─────────┴─────────────┘ │
//! ├─────────────────────────────────────┤
//! │ Record 2                            │
//! │ ┌─────────┬─────────┬─────────────┐ │
//! │ │ CRC (4) │ Len (4) │ Payload     │ │
//! │ └─────────┴─────────┴─────────────┘ │
//! └─────────────────────────────────────┘
//! ```
//! Payload is the bincode encoding of a [`Record`]; the CRC covers it.

mod record;
mod writer;
mod reader;

pub use record::{Record, HEADER_SIZE, MAX_RECORD_SIZE};
pub use writer::AofWriter;
pub use reader::{AofReader, ReadStats, TailState};

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;

/// Shared handle to one append-only log file
pub struct Aof {
    path: PathBuf,
    writer: Mutex<AofWriter>,
}

impl Aof {
    /// Open or create the log at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let writer = AofWriter::open(path)?;
        tracing::debug!(path = %path.display(), bytes = writer.len(), "Opened append-only log");

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
        })
    }

    /// Durably append one record; returns only after it is synced
    pub fn append(&self, record: &Record) -> Result<()> {
        self.writer.lock().append(record)
    }

    /// Read every record from the start of the file
    ///
    /// Each call opens a fresh read handle, so the sequence can be restarted.
    pub fn read_all(&self) -> Result<AofReader> {
        AofReader::open(&self.path)
    }

    /// Drop everything past the first `len` bytes
    pub fn truncate(&self, len: u64) -> Result<()> {
        self.writer.lock().truncate(len)
    }

    /// Force sync to disk
    pub fn sync(&self) -> Result<()> {
        self.writer.lock().sync()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this handle
    pub fn records_appended(&self) -> u64 {
        self.writer.lock().records_appended()
    }

    /// Current file length in bytes
    pub fn len(&self) -> u64 {
        self.writer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writer.lock().is_empty()
    }
}
