//! Synchronization service
//!
//! Wires the protocol, a transport and the message receiver together. The
//! enforcement layer calls the dispatch methods after a change is committed;
//! the runtime drives [`SynchronizationService::run`] as a background task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use shared_types::{Enforcement, EnforcementMode, EnforcementOptions, PunishmentId, PunishmentRef};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::SyncError;
use crate::ports::{DispatchOutcome, SyncTransport, SynchronizationApi};
use crate::protocol::SynchronizationProtocol;
use crate::receiver::{MessageReceiver, ReceiveOutcome};

/// Running counters for one service instance.
#[derive(Debug, Default)]
pub struct SyncStats {
    dispatched: AtomicU64,
    skipped: AtomicU64,
    applied: AtomicU64,
    missing: AtomicU64,
    decode_failures: AtomicU64,
    receive_failures: AtomicU64,
    poll_failures: AtomicU64,
}

/// Point-in-time copy of [`SyncStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    pub dispatched: u64,
    pub skipped: u64,
    pub applied: u64,
    pub missing: u64,
    pub decode_failures: u64,
    pub receive_failures: u64,
    pub poll_failures: u64,
}

impl SyncStats {
    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            receive_failures: self.receive_failures.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Dispatches local changes and applies changes made elsewhere.
pub struct SynchronizationService {
    protocol: SynchronizationProtocol,
    transport: Arc<dyn SyncTransport>,
    receiver: MessageReceiver,
    stats: SyncStats,
}

impl SynchronizationService {
    pub fn new(
        protocol: SynchronizationProtocol,
        transport: Arc<dyn SyncTransport>,
        receiver: MessageReceiver,
    ) -> Self {
        Self {
            protocol,
            transport,
            receiver,
            stats: SyncStats::default(),
        }
    }

    pub fn protocol(&self) -> &SynchronizationProtocol {
        &self.protocol
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }

    /// Poll on `interval` until `shutdown` turns true.
    ///
    /// The first tick fires immediately and establishes the transport's
    /// baseline.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            instance_id = %self.protocol.instance_id(),
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "Synchronization poll loop started"
        );
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Synchronization poll loop stopped");
    }

    async fn send(&self, message: Bytes) -> Result<DispatchOutcome, SyncError> {
        self.transport.dispatch(message).await?;
        SyncStats::bump(&self.stats.dispatched);
        Ok(DispatchOutcome::Dispatched)
    }

    async fn apply(&self, payload: Bytes) -> bool {
        let packet = match self.protocol.deserialize(payload) {
            Ok(Some(packet)) => packet,
            Ok(None) => return false,
            Err(e) => {
                SyncStats::bump(&self.stats.decode_failures);
                warn!(error = %e, "Dropping malformed synchronization message");
                return false;
            }
        };

        let punishment_id = packet.punishment_id();
        match self.receiver.on_receive(packet).await {
            Ok(ReceiveOutcome::Applied) => {
                SyncStats::bump(&self.stats.applied);
                true
            }
            Ok(ReceiveOutcome::PunishmentMissing) => {
                SyncStats::bump(&self.stats.missing);
                true
            }
            Err(e) => {
                SyncStats::bump(&self.stats.receive_failures);
                error!(punishment_id, error = %e, "Failed to apply synchronization message");
                false
            }
        }
    }
}

#[async_trait]
impl SynchronizationApi for SynchronizationService {
    async fn dispatch_change(
        &self,
        reference: PunishmentRef,
        mode: EnforcementMode,
        options: &EnforcementOptions,
    ) -> Result<DispatchOutcome, SyncError> {
        if options.enforcement != Enforcement::Global {
            SyncStats::bump(&self.stats.skipped);
            debug!(
                punishment = %reference,
                enforcement = ?options.enforcement,
                "Change stays on this process"
            );
            return Ok(DispatchOutcome::Skipped);
        }
        let message = self.protocol.serialize(reference, mode, options)?;
        self.send(message).await
    }

    async fn dispatch_expunge(&self, id: PunishmentId) -> Result<DispatchOutcome, SyncError> {
        let message = self.protocol.serialize_expunge(id)?;
        self.send(message).await
    }

    async fn dispatch_update_details(
        &self,
        id: PunishmentId,
    ) -> Result<DispatchOutcome, SyncError> {
        let message = self.protocol.serialize_update_details(id)?;
        self.send(message).await
    }

    async fn poll_once(&self) -> usize {
        let payloads = match self.transport.poll().await {
            Ok(payloads) => payloads,
            Err(e) => {
                SyncStats::bump(&self.stats.poll_failures);
                warn!(error = %e, "Synchronization poll failed");
                return 0;
            }
        };

        let mut handled = 0;
        for payload in payloads {
            if self.apply(payload).await {
                handled += 1;
            }
        }
        handled
    }
}
