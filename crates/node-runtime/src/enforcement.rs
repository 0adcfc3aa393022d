//! # Enforcement Facade
//!
//! Entry point for moderation commands on this process. Each call runs the
//! local step through the cache-aware enforcer and then dispatches the change
//! so every other process applies it too.
//!
//! ```text
//! command ──→ EnforcementFacade ──→ CacheAwareEnforcer ──→ platform
//!                    │                      └──→ mute cache
//!                    └──→ SynchronizationService ──→ transport
//! ```

use std::sync::Arc;

use ms_01_synchronization::{DispatchOutcome, LocalEnforcer, SyncError, SynchronizationApi};
use shared_types::{
    Enforcement, EnforcementError, EnforcementMode, EnforcementOptions, Punishment, PunishmentId,
    PunishmentRef,
};
use thiserror::Error;
use tracing::debug;

/// Failure of a local step or of the dispatch that follows it.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("Local enforcement failed: {0}")]
    Enforcement(#[from] EnforcementError),

    #[error("Dispatch failed: {0}")]
    Sync(#[from] SyncError),
}

/// Applies committed changes locally and announces them.
pub struct EnforcementFacade {
    enforcer: Arc<dyn LocalEnforcer>,
    sync: Arc<dyn SynchronizationApi>,
}

impl EnforcementFacade {
    pub fn new(enforcer: Arc<dyn LocalEnforcer>, sync: Arc<dyn SynchronizationApi>) -> Self {
        Self { enforcer, sync }
    }

    /// Enforce a newly committed punishment.
    pub async fn enact(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<DispatchOutcome, FacadeError> {
        if options.enforcement == Enforcement::None {
            debug!(punishment = %punishment.reference(), "Recorded without enforcement");
            return Ok(DispatchOutcome::Skipped);
        }
        self.enforcer.enforce_locally(punishment, options).await?;
        let outcome = self
            .sync
            .dispatch_change(punishment.reference(), EnforcementMode::Do, options)
            .await?;
        Ok(outcome)
    }

    /// Lift a punishment whose details are known.
    pub async fn revoke(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<DispatchOutcome, FacadeError> {
        if options.enforcement == Enforcement::None {
            debug!(punishment = %punishment.reference(), "Lifted without enforcement");
            return Ok(DispatchOutcome::Skipped);
        }
        self.enforcer.unenforce_locally(punishment, options).await?;
        let outcome = self
            .sync
            .dispatch_change(punishment.reference(), EnforcementMode::Undo, options)
            .await?;
        Ok(outcome)
    }

    /// Lift a punishment known only by identity.
    pub async fn revoke_by_id(
        &self,
        reference: PunishmentRef,
        options: &EnforcementOptions,
    ) -> Result<DispatchOutcome, FacadeError> {
        if options.enforcement == Enforcement::None {
            debug!(punishment = %reference, "Lifted without enforcement");
            return Ok(DispatchOutcome::Skipped);
        }
        self.enforcer.unenforce_by_id_locally(reference, options).await?;
        let outcome = self
            .sync
            .dispatch_change(reference, EnforcementMode::Undo, options)
            .await?;
        Ok(outcome)
    }

    /// Forget an expunged punishment here and everywhere else.
    pub async fn expunge(&self, id: PunishmentId) -> Result<DispatchOutcome, FacadeError> {
        self.enforcer.clear_expunged_locally(id).await?;
        Ok(self.sync.dispatch_expunge(id).await?)
    }

    /// Reload edited details here and everywhere else.
    pub async fn update_details(&self, id: PunishmentId) -> Result<DispatchOutcome, FacadeError> {
        self.enforcer.refresh_details_locally(id).await?;
        Ok(self.sync.dispatch_update_details(id).await?)
    }
}
