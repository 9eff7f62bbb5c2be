//! Connection Listener
//!
//! A TCP listener whose blocking `accept` can be interrupted by `close`.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{KvError, Result};

/// How often a pending accept re-checks for a connection or a close
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Longest pause after repeated accept failures
pub const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Pause schedule for an accept loop that keeps failing
///
/// Starts at `ACCEPT_POLL_INTERVAL`, doubles per consecutive failure up to
/// `MAX_ACCEPT_BACKOFF`, and starts over after a success. Running out of
/// file descriptors under load then slows the loop down instead of ending it.
#[derive(Debug, Default)]
pub struct AcceptBackoff {
    failures: u32,
}

impl AcceptBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return how long to wait before the next accept
    pub fn failed(&mut self) -> Duration {
        let shift = self.failures.min(16);
        self.failures = self.failures.saturating_add(1);
        ACCEPT_POLL_INTERVAL
            .saturating_mul(1u32 << shift)
            .min(MAX_ACCEPT_BACKOFF)
    }

    pub fn succeeded(&mut self) {
        self.failures = 0;
    }

    /// Failures since the last success
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Listening socket shared between the accept loop and the shutdown path
///
/// The socket is non-blocking; `accept` polls it and releases the lock
/// between polls, so `close` can always get in and drop it.
pub struct Listener {
    inner: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `port` on all interfaces
    pub fn bind(port: u16) -> Result<Self> {
        Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    /// Bind to a specific address
    pub fn bind_addr(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| KvError::Network(format!("bind {}: {}", addr, e)))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| KvError::Network(format!("configure listener: {}", e)))?;
        let local_addr = listener.local_addr()?;

        tracing::debug!(addr = %local_addr, "Listener bound");
        Ok(Self {
            inner: Mutex::new(Some(listener)),
            local_addr,
        })
    }

    /// Wait for the next client
    ///
    /// Blocks until a client connects, the socket fails, or `close` is
    /// called; after a close this returns `KvError::ListenerClosed`. A client
    /// whose socket cannot be switched back to blocking mode is dropped and
    /// the wait goes on.
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        loop {
            {
                let guard = self.inner.lock();
                let listener = guard.as_ref().ok_or(KvError::ListenerClosed)?;

                match listener.accept() {
                    Ok((stream, peer)) => match stream.set_nonblocking(false) {
                        Ok(()) => return Ok((stream, peer)),
                        Err(e) => {
                            tracing::warn!(%peer, error = %e, "Dropping client, socket setup failed");
                            continue;
                        }
                    },
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(KvError::Network(format!("accept: {}", e))),
                }
            }
            thread::sleep(ACCEPT_POLL_INTERVAL);
        }
    }

    /// Stop accepting and release the port
    ///
    /// Safe to call more than once; returns true only for the call that
    /// actually closed the socket.
    pub fn close(&self) -> bool {
        let closed = self.inner.lock().take().is_some();
        if closed {
            tracing::debug!(addr = %self.local_addr, "Listener closed");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
