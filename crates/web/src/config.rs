//! Server settings.
//!
//! [`ServerConfig`] deserializes with serde and fills every missing field
//! with its default, so an embedding binary can load a partial JSON or TOML
//! document.

use std::time::Duration;

use serde::Deserialize;

use crate::server::ServerBuildError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_count: usize,
    /// Queue slots per worker: the queue holds `worker_count * backlog_factor` connections.
    pub backlog_factor: usize,
    /// How long an idle worker waits on the queue before checking the stop flag.
    pub poll_interval_ms: u64,
    /// How long shutdown waits for each worker.
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            worker_count: 16,
            backlog_factor: 8,
            poll_interval_ms: 250,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Capacity of the pending-connection queue, also used as the listen backlog.
    pub fn queue_capacity(&self) -> usize {
        self.worker_count.saturating_mul(self.backlog_factor)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ServerBuildError> {
        if self.worker_count == 0 {
            return Err(ServerBuildError::invalid_config("worker_count must be at least 1"));
        }
        if self.backlog_factor == 0 {
            return Err(ServerBuildError::invalid_config("backlog_factor must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ServerBuildError::invalid_config("poll_interval_ms must be at least 1"));
        }
        if u32::try_from(self.queue_capacity()).is_err() {
            return Err(ServerBuildError::invalid_config("worker_count * backlog_factor does not fit a listen backlog"));
        }
        Ok(())
    }
}
