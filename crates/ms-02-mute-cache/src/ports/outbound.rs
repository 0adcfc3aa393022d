//! Outbound Ports (Driven Ports)
//!
//! What the mute caches need from the store and the platform.

use async_trait::async_trait;
use shared_types::{Punishment, RenderedMessage, StoreError, UserId};

use crate::domain::MuteCacheKey;

/// Looks up the mute currently applicable to a connection (Driven Port).
#[async_trait]
pub trait MuteQuery: Send + Sync {
    /// The active mute covering the user or their address, if any.
    ///
    /// When several apply, implementations return the one ending latest.
    async fn query_applicable_mute(
        &self,
        key: MuteCacheKey,
    ) -> Result<Option<Punishment>, StoreError>;
}

/// Presence information from the platform (Driven Port).
pub trait OnlineRoster: Send + Sync {
    /// Whether the user is connected to this process right now.
    fn is_online(&self, user: UserId) -> bool;
}

/// Renders the message shown to a muted user (Driven Port).
#[async_trait]
pub trait MuteMessageFormatter: Send + Sync {
    /// May resolve operator names, hence async.
    async fn render_denial(&self, punishment: &Punishment) -> RenderedMessage;
}
