//! Outbound Ports (Driven Ports)
//!
//! Dependencies the Synchronization subsystem needs from the outside world:
//! the shared medium messages travel through, the punishment store, and the
//! platform's local enforcement layer.

use async_trait::async_trait;
use bytes::Bytes;
use shared_types::{
    EnforcementError, EnforcementOptions, Punishment, PunishmentId, PunishmentRef,
    PunishmentType, StoreError, Timestamp,
};

use crate::error::SyncError;

/// Moves encoded envelopes between processes (Driven Port).
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Send one encoded envelope to every other process.
    ///
    /// Resolves once the message is durable in the medium.
    async fn dispatch(&self, message: Bytes) -> Result<(), SyncError>;

    /// Collect messages that arrived since the previous poll.
    async fn poll(&self) -> Result<Vec<Bytes>, SyncError>;
}

/// A row in the shared mailbox table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxRow {
    /// Encoded envelope.
    pub message: Bytes,
    /// Wall-clock insertion time, milliseconds since the Unix epoch.
    pub time: Timestamp,
}

/// Append-only row store acting as a mailbox (Driven Port).
///
/// Readers never delete rows. Pruning old rows is housekeeping owned by the
/// store operator.
#[async_trait]
pub trait MailboxStore: Send + Sync {
    /// Append a row.
    async fn insert(&self, row: MailboxRow) -> Result<(), StoreError>;

    /// Rows with `after < time <= up_to`, ordered by time ascending.
    async fn select_between(
        &self,
        after: Timestamp,
        up_to: Timestamp,
    ) -> Result<Vec<MailboxRow>, StoreError>;
}

/// Punishment lookup against the shared store (Driven Port).
#[async_trait]
pub trait PunishmentSelector: Send + Sync {
    /// Fetch a punishment by identifier and type.
    ///
    /// `Ok(None)` when the punishment no longer exists, e.g. it was expunged
    /// after the notification was sent.
    async fn fetch_by_id_and_type(
        &self,
        id: PunishmentId,
        kind: PunishmentType,
    ) -> Result<Option<Punishment>, StoreError>;
}

/// Local enforcement on this process only (Driven Port).
///
/// # Contract
///
/// No method here may dispatch a synchronization message, directly or
/// indirectly. Every process calls these for every message it receives; a
/// re-dispatch would make each message circulate forever.
#[async_trait]
pub trait LocalEnforcer: Send + Sync {
    /// Apply a punishment to connected users.
    async fn enforce_locally(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError>;

    /// Lift a punishment whose details are known.
    async fn unenforce_locally(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError>;

    /// Lift a punishment known only by identity.
    async fn unenforce_by_id_locally(
        &self,
        reference: PunishmentRef,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError>;

    /// Forget everything cached about an expunged punishment.
    async fn clear_expunged_locally(&self, id: PunishmentId) -> Result<(), EnforcementError>;

    /// Re-read a punishment's details into local caches.
    async fn refresh_details_locally(&self, id: PunishmentId) -> Result<(), EnforcementError>;
}
