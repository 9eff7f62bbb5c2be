//! Response definitions
//!
//! What the server sends back for each request.

use crate::error::KvError;

/// Outcome of a request, first byte of every response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// Applied; carries the value for a GET hit
    Ok = 0x00,

    /// GET of a key that is not set
    NotFound = 0x01,

    /// Malformed request or failed mutation; carries a message
    Error = 0x02,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::NotFound),
            0x02 => Some(Status::Error),
            _ => None,
        }
    }
}

/// A response frame
///
/// An empty payload goes over the wire as length zero and decodes as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub payload: Option<Vec<u8>>,
}

impl Response {
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// Result of a lookup: the value when set, NOT_FOUND otherwise
    pub fn value(value: Option<Vec<u8>>) -> Self {
        match value {
            Some(value) => Self::ok(Some(value)),
            None => Self::not_found(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(Some(b"PONG".to_vec()))
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error message carried by an ERROR response
    pub fn error_message(&self) -> Option<String> {
        match (self.status, &self.payload) {
            (Status::Error, Some(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            (Status::Error, None) => Some(String::new()),
            _ => None,
        }
    }
}

impl From<&KvError> for Response {
    fn from(err: &KvError) -> Self {
        Response::error(&err.to_string())
    }
}
