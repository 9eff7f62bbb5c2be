//! Configuration for aofkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{KvError, Result};
use crate::util::RetryPolicy;

/// Main configuration for an aofkv server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only log. Parent directories are created on open.
    pub storage_file_path: PathBuf,

    // -------------------------------------------------------------------------
    // Startup Policy
    // -------------------------------------------------------------------------
    /// Attempts made for recovery and for binding the listener
    pub retry_attempts: u32,

    /// Delay before the first retry; doubles on each further attempt
    pub retry_base_delay_ms: u64,

    /// Wall-clock budget for the whole recovery pass, retries included
    pub recovery_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP port to listen on (0 picks an ephemeral port)
    pub port: u16,

    /// Read timeout for the rest of a request once its first byte arrived
    pub read_timeout_ms: u64,

    /// Write timeout for responses (0 disables)
    pub write_timeout_ms: u64,

    /// How often an idle connection checks whether the server is draining
    pub idle_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_file_path: PathBuf::from("./aofkv_data/aof.log"),
            retry_attempts: 5,
            retry_base_delay_ms: 300,
            recovery_timeout_ms: 6000,
            port: 6379,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            idle_poll_ms: 100,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings that cannot work before any I/O happens
    pub fn validate(&self) -> Result<()> {
        if self.storage_file_path.as_os_str().is_empty() {
            return Err(KvError::Config("storage file path is empty".to_string()));
        }
        if self.retry_attempts == 0 {
            return Err(KvError::Config(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        if self.recovery_timeout_ms == 0 {
            return Err(KvError::Config(
                "recovery timeout must be greater than zero".to_string(),
            ));
        }
        if self.idle_poll_ms == 0 {
            return Err(KvError::Config(
                "idle poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry policy shared by recovery and listener bind
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    /// Deadline for the recovery pass
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the append-only log path
    pub fn storage_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_file_path = path.into();
        self
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the number of startup attempts
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_attempts = attempts;
        self
    }

    /// Set the base retry delay (in milliseconds)
    pub fn retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_base_delay_ms = ms;
        self
    }

    /// Set the recovery deadline (in milliseconds)
    pub fn recovery_timeout_ms(mut self, ms: u64) -> Self {
        self.config.recovery_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the idle poll interval (in milliseconds)
    pub fn idle_poll_ms(mut self, ms: u64) -> Self {
        self.config.idle_poll_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
