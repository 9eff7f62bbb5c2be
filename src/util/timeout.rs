//! Deadline-bounded execution

use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};

use crate::error::{KvError, Result};

/// Run `operation` on a worker thread and wait at most `deadline` for it
///
/// On timeout the worker is left detached; the caller is expected to abort
/// whatever depended on the result. A worker that panics surfaces as a
/// persistence error rather than unwinding into the caller.
pub fn with_timeout<T, F>(name: &str, deadline: Duration, operation: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = channel::bounded(1);
    let started = Instant::now();

    thread::Builder::new()
        .name(format!("{}-worker", name))
        .spawn(move || {
            // Receiver may be gone after a timeout
            let _ = tx.send(operation());
        })?;

    match rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::error!(operation = name, elapsed_ms, "Deadline exceeded");
            Err(KvError::Timeout {
                operation: name.to_string(),
                elapsed_ms,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(KvError::Persistence(format!(
            "{} worker exited without a result",
            name
        ))),
    }
}
