//! TCP Server
//!
//! Accepts connections and runs one handler thread per client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use crossbeam::sync::WaitGroup;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::util::retry;
use super::{AcceptBackoff, Connection, Listener, ShutdownCoordinator};

/// TCP server for aofkv
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: Arc<Listener>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl Server {
    /// Bind the listener, retrying per the configured policy
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let port = config.port;
        let listener = retry("bind", &config.retry_policy(), || Listener::bind(port))?;
        Ok(Self::with_listener(config, engine, listener))
    }

    /// Serve on an already bound listener
    pub fn with_listener(config: Config, engine: Arc<Engine>, listener: Listener) -> Self {
        let listener = Arc::new(listener);
        let shutdown = Arc::new(ShutdownCoordinator::new(Arc::clone(&listener)));
        Self {
            config,
            engine,
            listener,
            shutdown,
        }
    }

    /// Run the accept loop until shutdown, then wait for every handler
    ///
    /// Returns only after all connections accepted before the shutdown have
    /// finished. Only the close ends the loop: other accept failures (file
    /// descriptors exhausted, a client aborting during the handshake) are
    /// logged and retried after a growing pause.
    pub fn run(&self) -> Result<()> {
        tracing::info!(addr = %self.local_addr(), "Server accepting connections");

        let handlers = WaitGroup::new();
        let mut backoff = AcceptBackoff::new();

        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => {
                    backoff.succeeded();
                    accepted
                }
                Err(KvError::ListenerClosed) => break,
                Err(e) => {
                    let pause = backoff.failed();
                    tracing::warn!(
                        error = %e,
                        failures = backoff.failures(),
                        pause_ms = pause.as_millis() as u64,
                        "Failed to accept connection"
                    );
                    thread::sleep(pause);
                    continue;
                }
            };

            // Raced with the close: the socket was already queued
            if self.shutdown.is_draining() {
                drop(stream);
                break;
            }

            tracing::debug!(%peer, "Client connected");
            if let Err(e) = self.spawn_handler(stream, peer, handlers.clone()) {
                tracing::warn!(%peer, error = %e, "Could not start connection handler");
            }
        }

        tracing::info!("Waiting for open connections to finish");
        handlers.wait();
        tracing::info!("All connections closed");

        // Nothing accepted after the drain can append, so this is the last write
        if let Some(aof) = self.engine.aof() {
            if let Err(e) = aof.sync() {
                tracing::error!(error = %e, "Failed to sync log after drain");
                return Err(e);
            }
            tracing::debug!(records = aof.records_appended(), "Log synced");
        }
        Ok(())
    }

    fn spawn_handler(
        &self,
        stream: std::net::TcpStream,
        peer: SocketAddr,
        guard: WaitGroup,
    ) -> Result<()> {
        let mut connection = Connection::new(stream, Arc::clone(&self.engine), Arc::clone(&self.shutdown))?;
        connection.set_timeouts(
            self.config.read_timeout_ms,
            self.config.write_timeout_ms,
            self.config.idle_poll_ms,
        )?;

        thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                // Dropped when the handler finishes, releasing the drain
                let _guard = guard;
                if let Err(e) = connection.handle() {
                    tracing::warn!(peer = %connection.peer_addr(), error = %e, "Connection ended with error");
                }
            })?;
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) -> bool {
        self.shutdown.begin_shutdown()
    }

    /// Coordinator handle, for wiring a stop signal
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        Arc::clone(&self.shutdown)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}
