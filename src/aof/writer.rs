//! AOF Writer
//!
//! Handles appending records to the log file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{KvError, Result};
use super::Record;

/// Appends records to the log file, syncing each one before returning
pub struct AofWriter {
    file: File,
    path: PathBuf,

    /// Length of the file up to the last fully written record
    len: u64,

    records_appended: u64,
}

impl AofWriter {
    /// Open or create a log file for appending
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                KvError::Persistence(format!("create directory {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| KvError::Persistence(format!("open {}: {}", path.display(), e)))?;
        let len = file.metadata()?.len();

        Ok(Self {
            file,
            path: path.to_path_buf(),
            len,
            records_appended: 0,
        })
    }

    /// Append a record and sync it to stable storage
    ///
    /// If the write fails part way the file is cut back to the previous
    /// record boundary, so a failed append never strands a partial frame in
    /// front of later records.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        let frame = record.encode()?;

        if let Err(e) = self.write_frame(&frame) {
            if let Err(truncate_err) = self.file.set_len(self.len) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %truncate_err,
                    "Failed to roll back partial append"
                );
            }
            return Err(KvError::Persistence(format!(
                "append to {}: {}",
                self.path.display(),
                e
            )));
        }

        self.len += frame.len() as u64;
        self.records_appended += 1;
        Ok(())
    }

    /// Cut the file back to `len` bytes and sync
    ///
    /// Used at startup to drop an unreadable tail, so new records are not
    /// appended behind bytes that replay would stop at.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        if len >= self.len {
            return Ok(());
        }
        self.file
            .set_len(len)
            .and_then(|()| self.file.sync_all())
            .map_err(|e| {
                KvError::Persistence(format!("truncate {}: {}", self.path.display(), e))
            })?;
        self.len = len;
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.file.write_all(frame)?;
        self.file.sync_data()
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Records appended through this writer since it was opened
    pub fn records_appended(&self) -> u64 {
        self.records_appended
    }

    /// Current length of the log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
