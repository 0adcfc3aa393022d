//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for the enforcement layer and runtime
//! - Driven Ports (outbound) - Transport medium, store and local enforcement

pub mod inbound;
pub mod outbound;

pub use inbound::{DispatchOutcome, SynchronizationApi};
pub use outbound::{LocalEnforcer, MailboxRow, MailboxStore, PunishmentSelector, SyncTransport};
