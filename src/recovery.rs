//! Recovery
//!
//! Rebuilds the in-memory map at startup by replaying the append-only log
//! into an engine running in recovering mode.

use std::path::Path;
use std::time::Instant;

use crate::aof::{AofReader, Record, TailState};
use crate::engine::{Engine, Mode};
use crate::error::{KvError, Result};

/// Outcome of one replay pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Records applied to the engine
    pub records_applied: u64,

    /// SET records among them
    pub sets: u64,

    /// DELETE records among them
    pub deletes: u64,

    /// Length of the readable prefix of the log
    pub valid_bytes: u64,

    /// Bytes dropped from a torn or corrupt tail
    pub truncated_bytes: u64,

    /// How the readable prefix ended
    pub tail: TailState,

    /// Keys present once the replay finished
    pub keys: usize,
}

/// Replays a log into a recovering engine
///
/// Performs no retries; the caller wraps `recover` in whatever retry and
/// deadline policy it wants.
pub struct Replayer {
    engine: Engine,
}

impl Replayer {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Replay every record of the log at `path`, in file order
    ///
    /// The engine is reset first, so running this again after a failed
    /// attempt starts from an empty map. A missing log is an empty log.
    pub fn recover(&self, path: &Path) -> Result<ReplayReport> {
        if self.engine.mode() != Mode::Recovering {
            return Err(KvError::Config(
                "replay requires an engine in recovering mode".to_string(),
            ));
        }

        let started = Instant::now();
        self.engine.reset();

        let mut reader = AofReader::open(path)?;
        let mut report = ReplayReport::default();

        while let Some(record) = reader.next_record()? {
            match &record {
                Record::Set { .. } => report.sets += 1,
                Record::Delete { .. } => report.deletes += 1,
            }
            self.engine.apply(&record)?;
            report.records_applied += 1;
        }

        let stats = reader.stats();
        report.valid_bytes = stats.bytes_read;
        report.truncated_bytes = stats.truncated_bytes;
        report.tail = stats.tail;
        report.keys = self.engine.len();

        tracing::info!(
            path = %path.display(),
            records = report.records_applied,
            sets = report.sets,
            deletes = report.deletes,
            keys = report.keys,
            truncated_bytes = report.truncated_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Replayed append-only log"
        );
        Ok(report)
    }

    /// The engine holding the recovered state
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Hand the recovered engine back
    pub fn into_engine(self) -> Engine {
        self.engine
    }
}
