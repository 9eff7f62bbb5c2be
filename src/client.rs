//! Blocking client
//!
//! Speaks the wire protocol over one persistent TCP connection.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{KvError, Result};
use crate::protocol::{read_response, write_command, Command, Response, Status};

/// A connection to an aofkv server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| KvError::Network(format!("connect: {}", e)))?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one command and wait for its response
    pub fn request(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    /// Fetch a value; `None` when the key is not set
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let response = self.request(&Command::Get { key: key.to_vec() })?;
        match response.status {
            Status::Ok => Ok(Some(response.payload.unwrap_or_default())),
            Status::NotFound => Ok(None),
            Status::Error => Err(server_error(&response)),
        }
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let response = self.request(&Command::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        expect_ok(&response)
    }

    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        let response = self.request(&Command::Delete { key: key.to_vec() })?;
        expect_ok(&response)
    }

    pub fn ping(&mut self) -> Result<()> {
        let response = self.request(&Command::Ping)?;
        expect_ok(&response)
    }
}

fn expect_ok(response: &Response) -> Result<()> {
    if response.is_ok() {
        Ok(())
    } else {
        Err(server_error(response))
    }
}

fn server_error(response: &Response) -> KvError {
    match response.error_message() {
        Some(message) => KvError::Protocol(format!("server error: {}", message)),
        None => KvError::Protocol(format!("unexpected status {:?}", response.status)),
    }
}
