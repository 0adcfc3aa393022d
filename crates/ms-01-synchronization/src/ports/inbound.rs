//! Inbound Ports (Driving Ports)
//!
//! The API the enforcement layer uses to announce committed changes and the
//! runtime uses to drive polling.

use async_trait::async_trait;
use shared_types::{EnforcementMode, EnforcementOptions, PunishmentId, PunishmentRef};

use crate::error::SyncError;

/// Whether a change was handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The envelope was written to the shared medium.
    Dispatched,
    /// The options did not ask for cross-process enforcement.
    Skipped,
}

/// Primary synchronization API (Driving Port).
#[async_trait]
pub trait SynchronizationApi: Send + Sync {
    /// Announce an enforcement or un-enforcement committed to the store.
    ///
    /// Only `Enforcement::Global` changes leave this process.
    async fn dispatch_change(
        &self,
        reference: PunishmentRef,
        mode: EnforcementMode,
        options: &EnforcementOptions,
    ) -> Result<DispatchOutcome, SyncError>;

    /// Announce that a punishment was expunged.
    async fn dispatch_expunge(&self, id: PunishmentId) -> Result<DispatchOutcome, SyncError>;

    /// Announce that a punishment's details changed.
    async fn dispatch_update_details(&self, id: PunishmentId)
        -> Result<DispatchOutcome, SyncError>;

    /// Poll the transport once and apply every received packet locally.
    ///
    /// Returns the number of packets applied. Never fails: transport and
    /// decode errors are logged and treated as "no messages".
    async fn poll_once(&self) -> usize;
}
