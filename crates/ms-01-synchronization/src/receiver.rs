//! Message receiver
//!
//! Turns a packet received from another process into the matching local
//! enforcement step. The receiver depends only on the punishment selector and
//! the local enforcer; it has no access to any transport, so a received
//! message can never be dispatched again from here.

use std::sync::Arc;

use shared_types::{BroadcastingPolicy, EnforcementMode};
use tracing::{debug, warn};

use crate::domain::{EnforceUnenforcePacket, Packet};
use crate::error::ReceiveError;
use crate::ports::{LocalEnforcer, PunishmentSelector};

/// What the receiver did with a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The matching local operation ran.
    Applied,
    /// The referenced punishment is no longer in the store.
    PunishmentMissing,
}

/// Applies received packets locally, without re-broadcasting.
#[derive(Clone)]
pub struct MessageReceiver {
    selector: Arc<dyn PunishmentSelector>,
    enforcer: Arc<dyn LocalEnforcer>,
}

impl MessageReceiver {
    pub fn new(selector: Arc<dyn PunishmentSelector>, enforcer: Arc<dyn LocalEnforcer>) -> Self {
        Self { selector, enforcer }
    }

    /// Apply one packet.
    pub async fn on_receive(&self, packet: Packet) -> Result<ReceiveOutcome, ReceiveError> {
        match packet {
            Packet::Expunge(p) => {
                debug!(punishment_id = p.id, "Clearing expunged punishment");
                self.enforcer.clear_expunged_locally(p.id).await?;
                Ok(ReceiveOutcome::Applied)
            }
            Packet::UpdateDetails(p) => {
                debug!(punishment_id = p.id, "Refreshing punishment details");
                self.enforcer.refresh_details_locally(p.id).await?;
                Ok(ReceiveOutcome::Applied)
            }
            Packet::EnforceOrUnenforce(p) => self.enforce_or_unenforce(p).await,
        }
    }

    async fn enforce_or_unenforce(
        &self,
        packet: EnforceUnenforcePacket,
    ) -> Result<ReceiveOutcome, ReceiveError> {
        let options = packet.local_options();

        // Lifting enforcement silently needs no details.
        if packet.mode == EnforcementMode::Undo
            && packet.broadcasting == BroadcastingPolicy::None
        {
            debug!(punishment = %packet.reference(), "Unenforcing by id");
            self.enforcer
                .unenforce_by_id_locally(packet.reference(), &options)
                .await?;
            return Ok(ReceiveOutcome::Applied);
        }

        let Some(punishment) = self
            .selector
            .fetch_by_id_and_type(packet.id, packet.kind)
            .await?
        else {
            warn!(
                punishment = %packet.reference(),
                "Received change for a punishment that no longer exists"
            );
            return Ok(ReceiveOutcome::PunishmentMissing);
        };

        match packet.mode {
            EnforcementMode::Undo => {
                debug!(punishment = %packet.reference(), "Unenforcing");
                self.enforcer.unenforce_locally(&punishment, &options).await?;
            }
            EnforcementMode::Do => {
                debug!(punishment = %packet.reference(), "Enforcing");
                self.enforcer.enforce_locally(&punishment, &options).await?;
            }
        }
        Ok(ReceiveOutcome::Applied)
    }
}
