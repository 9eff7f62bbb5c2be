//! Startup Hardening Utilities
//!
//! Generic wrappers used around fallible startup steps (recovery, bind).
//! Both take a closure so they are not tied to any particular step.

mod retry;
mod timeout;

pub use retry::{retry, RetryPolicy};
pub use timeout::with_timeout;
