//! Synchronization configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Largest accepted poll interval (one minute).
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Medium the synchronization messages travel through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Timestamped rows in the shared store.
    #[default]
    Mailbox,
    /// Frames pushed over the message bus.
    Bus,
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Poll interval {value_ms}ms outside [{min_ms}, {max_ms}]")]
    PollIntervalOutOfRange {
        value_ms: u64,
        min_ms: u64,
        max_ms: u64,
    },
}

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay between two polls of the transport.
    pub poll_interval_ms: u64,
    pub transport: TransportKind,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 4_000,
            transport: TransportKind::Mailbox,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::PollIntervalOutOfRange {
                value_ms: self.poll_interval_ms,
                min_ms: MIN_POLL_INTERVAL_MS,
                max_ms: MAX_POLL_INTERVAL_MS,
            });
        }
        Ok(())
    }
}
