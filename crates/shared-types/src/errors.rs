//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised by the shared relational store.
///
/// Timeouts are enforced by the store layer and surface here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A query exceeded the store's timeout.
    #[error("Store query timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// A query or write failed.
    #[error("Store query failed: {0}")]
    QueryFailed(String),
}

/// Errors from local enforcement collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnforcementError {
    /// Lookup needed by the enforcement step failed.
    #[error("Store error during enforcement: {0}")]
    Store(#[from] StoreError),

    /// The platform failed to apply the change.
    #[error("Platform failed to apply enforcement: {0}")]
    Platform(String),
}
