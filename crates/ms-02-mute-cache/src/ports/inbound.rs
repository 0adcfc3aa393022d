//! Inbound Ports (Driving Ports)
//!
//! The interface the chat path, the connection listener and the enforcement
//! layer use, whichever cache variant is configured.

use async_trait::async_trait;
use shared_types::{Punishment, PunishmentId};

use crate::domain::{MuteCacheKey, MuteFuture, MuteValue};

/// Per-process cache of applicable mutes (Driving Port).
#[async_trait]
pub trait MuteCache: Send + Sync {
    /// The mute to enforce for a chat message or command.
    ///
    /// Never blocks on an in-flight refresh when a value is already cached.
    async fn get_cached_mute(&self, key: MuteCacheKey) -> MuteValue;

    /// Prepare for a user who just connected.
    ///
    /// Returns the computation to await when the caller needs a fresh
    /// answer, or `None` if this cache computes lazily.
    fn on_login(&self, key: MuteCacheKey) -> Option<MuteFuture>;

    /// Record a newly enacted mute for every cached key it covers.
    fn set_cached_mute(&self, punishment: &Punishment);

    /// Record a newly enacted mute for one key.
    fn set_cached_mute_for(&self, key: MuteCacheKey, punishment: &Punishment);

    /// Forget a lifted mute wherever it is cached. Returns entries cleared.
    fn clear_cached_mute(&self, punishment: &Punishment) -> usize;

    /// Forget a mute known only by id. Returns entries cleared.
    fn clear_cached_mute_by_id(&self, id: PunishmentId) -> usize;

    /// Number of cached keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
