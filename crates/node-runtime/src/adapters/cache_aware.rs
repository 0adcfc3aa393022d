//! # Cache-Aware Enforcer
//!
//! Decorates the platform's [`LocalEnforcer`] so every local change to a mute
//! also lands in the mute cache. Both the enforcement facade (changes made
//! here) and the message receiver (changes made elsewhere) go through this
//! adapter, so the cache sees the same stream of changes on every process.
//!
//! Like every `LocalEnforcer`, this adapter never dispatches.

use std::sync::Arc;

use async_trait::async_trait;
use ms_01_synchronization::{LocalEnforcer, PunishmentSelector};
use ms_02_mute_cache::MuteCache;
use shared_types::{
    EnforcementError, EnforcementOptions, Punishment, PunishmentId, PunishmentRef, PunishmentType,
};
use tracing::debug;

/// Keeps the mute cache in step with local enforcement.
pub struct CacheAwareEnforcer {
    inner: Arc<dyn LocalEnforcer>,
    cache: Arc<dyn MuteCache>,
    selector: Arc<dyn PunishmentSelector>,
}

impl CacheAwareEnforcer {
    pub fn new(
        inner: Arc<dyn LocalEnforcer>,
        cache: Arc<dyn MuteCache>,
        selector: Arc<dyn PunishmentSelector>,
    ) -> Self {
        Self {
            inner,
            cache,
            selector,
        }
    }
}

#[async_trait]
impl LocalEnforcer for CacheAwareEnforcer {
    async fn enforce_locally(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        if punishment.kind == PunishmentType::Mute {
            self.cache.set_cached_mute(punishment);
        }
        self.inner.enforce_locally(punishment, options).await
    }

    async fn unenforce_locally(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        if punishment.kind == PunishmentType::Mute {
            let cleared = self.cache.clear_cached_mute(punishment);
            debug!(punishment_id = punishment.id, cleared, "Cleared lifted mute");
        }
        self.inner.unenforce_locally(punishment, options).await
    }

    async fn unenforce_by_id_locally(
        &self,
        reference: PunishmentRef,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        if reference.kind == PunishmentType::Mute {
            self.cache.clear_cached_mute_by_id(reference.id);
        }
        self.inner.unenforce_by_id_locally(reference, options).await
    }

    async fn clear_expunged_locally(&self, id: PunishmentId) -> Result<(), EnforcementError> {
        // Ids are unique across types.
        self.cache.clear_cached_mute_by_id(id);
        self.inner.clear_expunged_locally(id).await
    }

    async fn refresh_details_locally(&self, id: PunishmentId) -> Result<(), EnforcementError> {
        if let Some(mute) = self
            .selector
            .fetch_by_id_and_type(id, PunishmentType::Mute)
            .await?
        {
            if self.cache.clear_cached_mute_by_id(id) > 0 {
                self.cache.set_cached_mute(&mute);
            }
        }
        self.inner.refresh_details_locally(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_01_synchronization::test_utils::{EnforcerCall, InMemorySelector, RecordingEnforcer};
    use ms_02_mute_cache::test_utils::{make_key, make_mute_for, ScriptedMuteQuery};
    use ms_02_mute_cache::{MuteCacheConfig, OnDemandMuteCache};

    struct Fixture {
        enforcer: CacheAwareEnforcer,
        platform: Arc<RecordingEnforcer>,
        cache: Arc<OnDemandMuteCache>,
        selector: Arc<InMemorySelector>,
    }

    fn fixture() -> Fixture {
        let platform = Arc::new(RecordingEnforcer::new());
        let cache = Arc::new(OnDemandMuteCache::new(
            Arc::new(ScriptedMuteQuery::new()),
            &MuteCacheConfig::default(),
        ));
        let selector = Arc::new(InMemorySelector::new());
        let enforcer = CacheAwareEnforcer::new(platform.clone(), cache.clone(), selector.clone());
        Fixture {
            enforcer,
            platform,
            cache,
            selector,
        }
    }

    #[tokio::test]
    async fn test_enforce_and_unenforce_update_cache() {
        let f = fixture();
        let key = make_key();
        assert_eq!(f.cache.get_cached_mute(key).await, None);

        let mute = make_mute_for(3, &key, 0);
        let options = EnforcementOptions::global();
        f.enforcer.enforce_locally(&mute, &options).await.unwrap();
        assert_eq!(f.cache.get_cached_mute(key).await, Some(mute.clone()));

        f.enforcer.unenforce_locally(&mute, &options).await.unwrap();
        assert_eq!(f.cache.get_cached_mute(key).await, None);

        assert_eq!(
            f.platform.calls(),
            vec![EnforcerCall::Enforce(mute.clone()), EnforcerCall::Unenforce(mute)]
        );
    }

    #[tokio::test]
    async fn test_expunge_clears_by_id() {
        let f = fixture();
        let key = make_key();
        f.cache.get_cached_mute(key).await;
        let mute = make_mute_for(8, &key, 0);
        f.enforcer
            .enforce_locally(&mute, &EnforcementOptions::global())
            .await
            .unwrap();

        f.enforcer.clear_expunged_locally(8).await.unwrap();

        assert_eq!(f.cache.get_cached_mute(key).await, None);
        assert_eq!(f.platform.calls().last(), Some(&EnforcerCall::ClearExpunged(8)));
    }

    #[tokio::test]
    async fn test_refresh_details_replaces_cached_copy() {
        let f = fixture();
        let key = make_key();
        f.cache.get_cached_mute(key).await;
        let mute = make_mute_for(4, &key, 0);
        f.enforcer
            .enforce_locally(&mute, &EnforcementOptions::global())
            .await
            .unwrap();

        let mut edited = mute.clone();
        edited.reason = "flooding".to_string();
        f.selector.insert(edited.clone());
        f.enforcer.refresh_details_locally(4).await.unwrap();

        assert_eq!(f.cache.get_cached_mute(key).await, Some(edited));
        assert_eq!(f.platform.calls().last(), Some(&EnforcerCall::RefreshDetails(4)));
    }

    #[tokio::test]
    async fn test_other_kinds_leave_cache_alone() {
        let f = fixture();
        let key = make_key();
        f.cache.get_cached_mute(key).await;
        let mut ban = make_mute_for(5, &key, 0);
        ban.kind = PunishmentType::Ban;

        f.enforcer
            .enforce_locally(&ban, &EnforcementOptions::global())
            .await
            .unwrap();

        assert_eq!(f.cache.get_cached_mute(key).await, None);
        assert_eq!(f.platform.calls(), vec![EnforcerCall::Enforce(ban)]);
    }
}
