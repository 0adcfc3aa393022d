//! # MS-01 Synchronization
//!
//! Keeps punishment enforcement consistent across every process that shares
//! one store. A process that commits a change dispatches a small notification;
//! every other process polls for notifications and applies them locally.
//!
//! ## Architecture
//!
//! Hexagonal, like every subsystem crate in this workspace:
//!
//! - **Domain Layer** (`domain/`): packets, envelope, wire primitives
//! - **Ports Layer** (`ports/`)
//!   - `SynchronizationApi`: driving port used by the enforcement layer
//!   - `SyncTransport`, `MailboxStore`, `PunishmentSelector`, `LocalEnforcer`:
//!     driven ports
//! - **Protocol** (`protocol.rs`): envelope stamping and self-message filtering
//! - **Receiver** (`receiver.rs`): local-only application of a packet
//! - **Service** (`service.rs`): `SynchronizationService` and the poll loop
//! - **Adapters Layer** (`adapters/`): mailbox and bus transports
//!
//! ## Wire format
//!
//! ```text
//! [1B version][16B origin instance][1B packet type][packet fields]
//! ```
//!
//! All integers are big-endian.
//!
//! ## Invariants
//!
//! - A process never applies a message it dispatched itself.
//! - Applying a received message never dispatches a new one.
//! - A mailbox row is read at most once per process.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod protocol;
pub mod receiver;
pub mod service;

/// Test doubles for the driven ports.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{BusTransport, InMemoryMailbox, MailboxTransport};
pub use config::{ConfigError, SyncConfig, TransportKind};
pub use domain::{
    DecodedEnvelope, EnforceUnenforcePacket, Envelope, ExpungePacket, Packet,
    UpdateDetailsPacket, PROTOCOL_VERSION,
};
pub use error::{DecodeError, EncodeError, ReceiveError, SyncError};
pub use ports::{
    DispatchOutcome, LocalEnforcer, MailboxRow, MailboxStore, PunishmentSelector, SyncTransport,
    SynchronizationApi,
};
pub use protocol::SynchronizationProtocol;
pub use receiver::{MessageReceiver, ReceiveOutcome};
pub use service::{SyncStats, SyncStatsSnapshot, SynchronizationService};
