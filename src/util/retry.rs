//! Bounded retry with exponential backoff

use std::thread;
use std::time::Duration;

use crate::error::{KvError, Result};

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,

    /// Wait after the first failure; doubled for every later failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    /// Backoff applied after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << shift)
    }
}

/// Run `operation` until it succeeds or the policy runs out of attempts
///
/// Returns the first success. After the last failure the error is wrapped in
/// `KvError::RetriesExhausted` together with the attempt count.
pub fn retry<T, F>(name: &str, policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation() {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation = name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt >= attempts => {
                tracing::error!(operation = name, attempts, error = %err, "Out of retries");
                return Err(KvError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }
            Err(err) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}
