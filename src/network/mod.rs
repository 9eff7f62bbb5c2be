//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor loop on an interruptible listener
//! - One thread per connection, all sharing the live Engine
//! - Shutdown closes the listener, then waits for every handler

mod listener;
mod shutdown;
mod connection;
mod server;

pub use listener::{AcceptBackoff, Listener, ACCEPT_POLL_INTERVAL, MAX_ACCEPT_BACKOFF};
pub use shutdown::{ShutdownCoordinator, State};
pub use connection::Connection;
pub use server::Server;
