//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{self, BufRead, BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{decode_command, read_frame, write_response, Command, Response};
use super::ShutdownCoordinator;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the live storage engine
    engine: Arc<Engine>,

    /// Consulted between requests to stop once the server drains
    shutdown: Arc<ShutdownCoordinator>,

    /// Read timeout once a request has started arriving
    read_timeout: Option<Duration>,

    /// Read timeout while idle between requests
    idle_poll: Duration,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(
        stream: TcpStream,
        engine: Arc<Engine>,
        shutdown: Arc<ShutdownCoordinator>,
    ) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            shutdown,
            read_timeout: None,
            idle_poll: Duration::from_millis(100),
            peer_addr,
        })
    }

    /// Configure connection timeouts
    ///
    /// A zero read or write timeout means "wait forever". `idle_poll_ms`
    /// bounds how long an idle connection takes to notice a shutdown.
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64, idle_poll_ms: u64) -> Result<()> {
        self.read_timeout = (read_ms > 0).then(|| Duration::from_millis(read_ms));
        self.idle_poll = Duration::from_millis(idle_poll_ms.max(1));

        let write_timeout = (write_ms > 0).then(|| Duration::from_millis(write_ms));
        self.writer.get_ref().set_write_timeout(write_timeout)?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects, an error occurs, or the server
    /// is draining and no request is in flight.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(peer = %self.peer_addr, "Connection established");

        loop {
            if !self.wait_for_request()? {
                return Ok(());
            }

            self.reader.get_ref().set_read_timeout(self.read_timeout)?;
            let frame = match read_frame(&mut self.reader) {
                Ok(frame) => frame,
                Err(KvError::Io(ref e)) if is_disconnect(e) => {
                    tracing::debug!(peer = %self.peer_addr, "Client disconnected mid-request");
                    return Ok(());
                }
                Err(KvError::Io(ref e)) if is_timeout(e) => {
                    tracing::debug!(peer = %self.peer_addr, "Read timeout mid-request");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "Unreadable request, closing");
                    // Send error response if possible
                    let _ = self.send_response(Response::from(&e));
                    return Err(e);
                }
            };

            // A well-framed but malformed request keeps the connection open
            let response = match decode_command(&frame) {
                Ok(command) => {
                    tracing::trace!(peer = %self.peer_addr, ?command, "Received command");
                    self.execute_command(command)
                }
                Err(e) => {
                    tracing::debug!(peer = %self.peer_addr, error = %e, "Malformed request");
                    Response::from(&e)
                }
            };

            // Send response
            if let Err(e) = self.send_response(response) {
                if let KvError::Io(ref io_err) = e {
                    if is_disconnect(io_err) {
                        tracing::debug!(
                            peer = %self.peer_addr,
                            error = %e,
                            "Client disconnected before response could be sent"
                        );
                        return Ok(());
                    }
                }
                tracing::warn!(peer = %self.peer_addr, error = %e, "Error writing response");
                return Err(e);
            }
        }
    }

    /// Block until a request starts arriving
    ///
    /// Returns false when the peer closed the connection, or when the server
    /// is draining while this connection sits idle.
    fn wait_for_request(&mut self) -> Result<bool> {
        self.reader.get_ref().set_read_timeout(Some(self.idle_poll))?;

        loop {
            if self.shutdown.is_draining() && self.reader.buffer().is_empty() {
                tracing::debug!(peer = %self.peer_addr, "Closing idle connection for shutdown");
                return Ok(false);
            }

            match self.reader.fill_buf() {
                Ok(buf) if buf.is_empty() => {
                    tracing::debug!(peer = %self.peer_addr, "Client disconnected");
                    return Ok(false);
                }
                Ok(_) => return Ok(true),
                Err(ref e) if is_timeout(e) || e.kind() == io::ErrorKind::Interrupted => {}
                Err(ref e) if is_disconnect(e) => {
                    tracing::debug!(peer = %self.peer_addr, error = %e, "Connection dropped");
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&self, command: Command) -> Response {
        let mutation = command.is_mutation();
        match self.engine.execute(command) {
            Ok(response) => response,
            Err(e) => {
                if mutation {
                    tracing::error!(peer = %self.peer_addr, error = %e, "Mutation rejected");
                }
                Response::from(&e)
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

// Windows reports read timeouts as TimedOut instead of WouldBlock
fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
