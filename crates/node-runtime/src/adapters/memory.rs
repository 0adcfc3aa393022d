//! # In-Memory Backends
//!
//! Stand-ins for the shared store and the game platform, used by the
//! standalone binary and by integration tests. A deployment replaces these
//! with adapters over its real database and server.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use ms_01_synchronization::{LocalEnforcer, PunishmentSelector};
use ms_02_mute_cache::{MuteCacheKey, MuteMessageFormatter, MuteQuery, OnlineRoster};
use parking_lot::RwLock;
use shared_types::{
    EnforcementError, EnforcementOptions, Punishment, PunishmentId, PunishmentRef,
    PunishmentType, RenderedMessage, StoreError, SystemTimeSource, TimeSource, UserId,
};
use tracing::info;

// =============================================================================
// PUNISHMENT STORE
// =============================================================================

/// Punishment table shared by every node in one process.
pub struct InMemoryPunishmentStore {
    punishments: RwLock<HashMap<PunishmentId, Punishment>>,
    /// Wall clock, for end-times.
    clock: Arc<dyn TimeSource>,
}

impl InMemoryPunishmentStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemTimeSource))
    }

    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            punishments: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Insert or replace a punishment.
    pub fn insert(&self, punishment: Punishment) {
        self.punishments.write().insert(punishment.id, punishment);
    }

    pub fn remove(&self, id: PunishmentId) -> Option<Punishment> {
        self.punishments.write().remove(&id)
    }

    pub fn get(&self, id: PunishmentId) -> Option<Punishment> {
        self.punishments.read().get(&id).cloned()
    }
}

impl Default for InMemoryPunishmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PunishmentSelector for InMemoryPunishmentStore {
    async fn fetch_by_id_and_type(
        &self,
        id: PunishmentId,
        kind: PunishmentType,
    ) -> Result<Option<Punishment>, StoreError> {
        Ok(self.get(id).filter(|p| p.kind == kind))
    }
}

#[async_trait]
impl MuteQuery for InMemoryPunishmentStore {
    async fn query_applicable_mute(
        &self,
        key: MuteCacheKey,
    ) -> Result<Option<Punishment>, StoreError> {
        let now = self.clock.now_secs();
        let punishments = self.punishments.read();
        let applicable = punishments.values().filter(|p| {
            p.kind == PunishmentType::Mute && !p.is_expired(now) && key.is_covered_by(&p.victim)
        });

        let mut latest: Option<&Punishment> = None;
        for mute in applicable {
            if latest.map_or(true, |current| mute.ends_later_than(current)) {
                latest = Some(mute);
            }
        }
        Ok(latest.cloned())
    }
}

// =============================================================================
// PLATFORM
// =============================================================================

/// Platform enforcer that only logs what a server would do.
pub struct LoggingPlatform {
    node: String,
}

impl LoggingPlatform {
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into() }
    }
}

#[async_trait]
impl LocalEnforcer for LoggingPlatform {
    async fn enforce_locally(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        info!(
            node = %self.node,
            punishment = %punishment.reference(),
            broadcasting = ?options.broadcasting,
            "Enforcing punishment"
        );
        Ok(())
    }

    async fn unenforce_locally(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        info!(
            node = %self.node,
            punishment = %punishment.reference(),
            broadcasting = ?options.broadcasting,
            "Lifting punishment"
        );
        Ok(())
    }

    async fn unenforce_by_id_locally(
        &self,
        reference: PunishmentRef,
        _options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        info!(node = %self.node, punishment = %reference, "Lifting punishment silently");
        Ok(())
    }

    async fn clear_expunged_locally(&self, id: PunishmentId) -> Result<(), EnforcementError> {
        info!(node = %self.node, punishment_id = id, "Forgetting expunged punishment");
        Ok(())
    }

    async fn refresh_details_locally(&self, id: PunishmentId) -> Result<(), EnforcementError> {
        info!(node = %self.node, punishment_id = id, "Refreshing punishment details");
        Ok(())
    }
}

/// Users connected to this node.
#[derive(Default)]
pub struct ConnectedUsers {
    users: RwLock<HashSet<UserId>>,
}

impl ConnectedUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, user: UserId) {
        self.users.write().insert(user);
    }

    pub fn disconnect(&self, user: UserId) {
        self.users.write().remove(&user);
    }

    pub fn count(&self) -> usize {
        self.users.read().len()
    }
}

impl OnlineRoster for ConnectedUsers {
    fn is_online(&self, user: UserId) -> bool {
        self.users.read().contains(&user)
    }
}

/// Renders denial messages without any markup.
pub struct PlainDenialFormatter;

#[async_trait]
impl MuteMessageFormatter for PlainDenialFormatter {
    async fn render_denial(&self, punishment: &Punishment) -> RenderedMessage {
        let message = if punishment.is_permanent() {
            format!("You are permanently muted: {}", punishment.reason)
        } else {
            format!("You are muted until {}: {}", punishment.end, punishment.reason)
        };
        RenderedMessage(message)
    }
}
