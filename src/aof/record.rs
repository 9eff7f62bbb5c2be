//! AOF Record definitions
//!
//! Defines a single logged mutation and its on-disk framing.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

/// Frame header: CRC32 (4) + payload length (4)
pub const HEADER_SIZE: usize = 8;

/// Largest payload accepted when reading; anything bigger is corruption
pub const MAX_RECORD_SIZE: u32 = 64 * 1024 * 1024;

/// A single mutation in the append-only log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    /// Set a key to a value
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Remove a key (absent keys are still logged)
    Delete { key: Vec<u8> },
}

impl Record {
    pub fn set(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Record::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Record::Delete { key: key.into() }
    }

    /// Key touched by this record
    pub fn key(&self) -> &[u8] {
        match self {
            Record::Set { key, .. } | Record::Delete { key } => key,
        }
    }

    /// Value carried by this record (empty for deletes)
    pub fn value(&self) -> &[u8] {
        match self {
            Record::Set { value, .. } => value,
            Record::Delete { .. } => &[],
        }
    }

    /// Encode into a self-delimiting frame: crc | len | payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        if payload.len() > MAX_RECORD_SIZE as usize {
            return Err(KvError::Serialization(format!(
                "record of {} bytes exceeds limit of {}",
                payload.len(),
                MAX_RECORD_SIZE
            )));
        }

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        frame.put_u32(crc32fast::hash(&payload));
        frame.put_u32(payload.len() as u32);
        frame.put_slice(&payload);
        Ok(frame.to_vec())
    }

    /// Decode one frame from the front of `bytes`
    ///
    /// Returns the record and the number of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(KvError::Persistence(format!(
                "incomplete record header: {} of {} bytes",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let header = FrameHeader::parse(&bytes[..HEADER_SIZE]);
        let total = HEADER_SIZE + header.len as usize;
        if header.len > MAX_RECORD_SIZE || bytes.len() < total {
            return Err(KvError::Persistence(format!(
                "incomplete record payload: expected {} bytes, got {}",
                header.len,
                bytes.len() - HEADER_SIZE
            )));
        }

        let record = Self::decode_payload(header.checksum, &bytes[HEADER_SIZE..total])?;
        Ok((record, total))
    }

    /// Verify and decode a payload whose header has already been parsed
    pub(crate) fn decode_payload(checksum: u32, payload: &[u8]) -> Result<Self> {
        let actual = crc32fast::hash(payload);
        if actual != checksum {
            return Err(KvError::Persistence(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                checksum, actual
            )));
        }
        Ok(bincode::deserialize(payload)?)
    }
}

/// Parsed frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub checksum: u32,
    pub len: u32,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            checksum: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            len: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}
