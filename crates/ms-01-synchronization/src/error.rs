//! Error types for the Synchronization subsystem

use shared_types::{EnforcementError, StoreError};
use thiserror::Error;

/// Errors raised while parsing bytes received from another process.
///
/// None of these are fatal: the poll loop logs them and drops the message,
/// since processes running a newer protocol may share the mailbox during a
/// rolling upgrade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated input: needed {needed} more bytes for {field}")]
    Truncated { field: &'static str, needed: usize },

    #[error("Unknown packet type discriminant: {0}")]
    UnknownPacketType(u8),

    #[error("Unknown ordinal {value} for {field}")]
    UnknownOrdinal { field: &'static str, value: u8 },

    #[error("Invalid boolean byte {0}")]
    InvalidBoolean(u8),

    #[error("Invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },
}

/// Errors raised while encoding a packet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("String too long for {field}: {len} bytes > {max}")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// Errors from dispatching or polling synchronization messages.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Transport store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from applying a received packet locally.
#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("Failed to fetch punishment: {0}")]
    Fetch(#[from] StoreError),

    #[error("Local enforcement failed: {0}")]
    Enforcement(#[from] EnforcementError),
}
