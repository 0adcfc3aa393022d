//! Chat and command gate.

use std::sync::Arc;

use shared_types::RenderedMessage;
use tracing::debug;

use crate::domain::MuteCacheKey;
use crate::ports::{MuteCache, MuteMessageFormatter};

/// Answers "may this user speak" with the denial message to show, if any.
#[derive(Clone)]
pub struct MuteChecker {
    cache: Arc<dyn MuteCache>,
    formatter: Arc<dyn MuteMessageFormatter>,
}

impl MuteChecker {
    pub fn new(cache: Arc<dyn MuteCache>, formatter: Arc<dyn MuteMessageFormatter>) -> Self {
        Self { cache, formatter }
    }

    /// `Some(message)` when the user is muted.
    pub async fn check_mute(&self, key: MuteCacheKey) -> Option<RenderedMessage> {
        let mute = self.cache.get_cached_mute(key).await?;
        debug!(%key, punishment_id = mute.id, "Denying chat for muted user");
        Some(self.formatter.render_denial(&mute).await)
    }
}
