//! Shutdown Coordinator
//!
//! Moves the server from running to draining exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Receiver;

use super::Listener;

/// Lifecycle state of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Accepting clients
    Running,

    /// No new clients; waiting for open handlers to finish
    Draining,
}

/// Closes the listener on the first stop request and tells handlers to wind
/// down between requests
pub struct ShutdownCoordinator {
    listener: Arc<Listener>,
    draining: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new(listener: Arc<Listener>) -> Self {
        Self {
            listener,
            draining: AtomicBool::new(false),
        }
    }

    /// Enter the draining state
    ///
    /// Only the first call has any effect; it returns true.
    pub fn begin_shutdown(&self) -> bool {
        if self.draining.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::info!(addr = %self.listener.local_addr(), "Shutting down, draining connections");
        self.listener.close();
        true
    }

    pub fn state(&self) -> State {
        if self.is_draining() {
            State::Draining
        } else {
            State::Running
        }
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Spawn the thread that waits for a stop notification
    ///
    /// Either a message or the sender being dropped counts as the signal.
    pub fn watch(self: &Arc<Self>, stop: Receiver<()>) -> std::io::Result<JoinHandle<()>> {
        let coordinator = Arc::clone(self);
        thread::Builder::new()
            .name("shutdown-watch".to_string())
            .spawn(move || {
                let _ = stop.recv();
                coordinator.begin_shutdown();
            })
    }
}
