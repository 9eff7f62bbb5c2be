//! AOF Reader
//!
//! Handles reading records from the log file, front to back.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{KvError, Result};
use super::record::FrameHeader;
use super::{Record, HEADER_SIZE, MAX_RECORD_SIZE};

/// How the readable prefix of a log ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TailState {
    /// Every byte belonged to a valid record
    #[default]
    Clean,

    /// The last frame runs past the end of the file: an append cut short
    Torn,

    /// A frame that fits in the file failed its checksum or decode
    Corrupt,
}

/// Statistics gathered while reading a log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Number of valid records read
    pub records_read: u64,

    /// Bytes covered by valid records
    pub bytes_read: u64,

    /// Bytes discarded after the last valid record
    pub truncated_bytes: u64,

    /// Whether a partial or corrupt tail was discarded
    pub was_truncated: bool,

    /// Why reading stopped
    pub tail: TailState,
}

/// Lazy, finite sequence of records read from the start of a log
///
/// A missing file reads as an empty log. The first partial or corrupt frame
/// ends the sequence: it is logged, counted and classified in
/// [`ReadStats::tail`], never reported as an error.
/// Only genuine I/O failures are yielded as `Err`.
pub struct AofReader {
    reader: Option<BufReader<File>>,
    path: PathBuf,
    file_len: u64,
    stats: ReadStats,
    finished: bool,
}

impl AofReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let (reader, file_len) = match File::open(path) {
            Ok(file) => {
                let len = file.metadata()?.len();
                (Some(BufReader::new(file)), len)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => (None, 0),
            Err(e) => {
                return Err(KvError::Persistence(format!(
                    "open {} for reading: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            file_len,
            stats: ReadStats::default(),
            finished: false,
        })
    }

    /// Read the next valid record, or `None` at the end of the valid prefix
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }
        let Some(reader) = self.reader.as_mut() else {
            self.finished = true;
            return Ok(None);
        };

        let mut header = [0u8; HEADER_SIZE];
        let n = read_up_to(reader, &mut header)?;
        if n == 0 {
            self.finished = true;
            return Ok(None);
        }
        if n < HEADER_SIZE {
            self.stop_at_tail(TailState::Torn, "partial header");
            return Ok(None);
        }

        let header = FrameHeader::parse(&header);
        let frame_end = self.stats.bytes_read + (HEADER_SIZE as u64) + u64::from(header.len);
        if frame_end > self.file_len {
            self.stop_at_tail(TailState::Torn, "partial payload");
            return Ok(None);
        }
        if header.len > MAX_RECORD_SIZE {
            self.stop_at_tail(TailState::Corrupt, "record length out of range");
            return Ok(None);
        }

        let mut payload = vec![0u8; header.len as usize];
        let n = read_up_to(reader, &mut payload)?;
        if n < payload.len() {
            // File shrank while being read
            self.stop_at_tail(TailState::Torn, "partial payload");
            return Ok(None);
        }

        match Record::decode_payload(header.checksum, &payload) {
            Ok(record) => {
                self.stats.records_read += 1;
                self.stats.bytes_read += (HEADER_SIZE + payload.len()) as u64;
                Ok(Some(record))
            }
            Err(e) => {
                self.stop_at_tail(TailState::Corrupt, &e.to_string());
                Ok(None)
            }
        }
    }

    /// Statistics for what has been read so far
    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    fn stop_at_tail(&mut self, tail: TailState, reason: &str) {
        self.finished = true;
        self.stats.was_truncated = true;
        self.stats.tail = tail;
        self.stats.truncated_bytes = self.file_len.saturating_sub(self.stats.bytes_read);
        tracing::warn!(
            path = %self.path.display(),
            records = self.stats.records_read,
            ?tail,
            discarded_bytes = self.stats.truncated_bytes,
            reason,
            "Discarding unreadable tail of append-only log"
        );
    }
}

impl Iterator for AofReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the stream allows, returning how many bytes were read
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
