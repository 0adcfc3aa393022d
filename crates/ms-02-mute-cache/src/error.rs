//! Error types for the mute caches

use shared_types::StoreError;
use thiserror::Error;

/// Failures while computing a cache value.
///
/// Never surfaced to callers: the refresh boundary logs these and stores
/// "no mute" instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Mute query failed: {0}")]
    Store(#[from] StoreError),
}

/// Invalid cache configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min_ms}ms, got {value_ms}ms")]
    TooShort {
        field: &'static str,
        value_ms: u64,
        min_ms: u64,
    },
}
