//! On-Demand mute cache
//!
//! A loading cache: the first read for a key starts the store query and
//! every concurrent reader awaits the same computation. Entries expire by
//! the configured [`ExpirationPolicy`], and a loaded mute whose end-time has
//! passed is evicted and reloaded once before answering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::{
    MonotonicTimeSource, Punishment, PunishmentId, PunishmentType, SystemTimeSource, TimeSource,
    Timestamp,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{ExpirationPolicy, MuteCacheConfig};
use crate::domain::{later_expiring, ready, MuteCacheKey, MuteFuture, MuteValue};
use crate::loader::spawn_query;
use crate::ports::{MuteCache, MuteQuery};

struct LoadingEntry {
    id: u64,
    future: MuteFuture,
    written: Timestamp,
    accessed: Timestamp,
}

impl LoadingEntry {
    /// The loaded value, or `None` while the load is in flight.
    fn completed(&self) -> Option<MuteValue> {
        self.future.peek().cloned()
    }
}

/// Mute cache loading values on first use.
pub struct OnDemandMuteCache {
    entries: DashMap<MuteCacheKey, LoadingEntry>,
    query: Arc<dyn MuteQuery>,
    clock: Arc<dyn TimeSource>,
    wall_clock: Arc<dyn TimeSource>,
    policy: ExpirationPolicy,
    next_entry_id: AtomicU64,
}

impl OnDemandMuteCache {
    pub fn new(query: Arc<dyn MuteQuery>, config: &MuteCacheConfig) -> Self {
        Self::with_clocks(
            query,
            config,
            Arc::new(MonotonicTimeSource::new()),
            Arc::new(SystemTimeSource),
        )
    }

    pub fn with_clocks(
        query: Arc<dyn MuteQuery>,
        config: &MuteCacheConfig,
        clock: Arc<dyn TimeSource>,
        wall_clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            query,
            clock,
            wall_clock,
            policy: config.expiration_policy(),
            next_entry_id: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> ExpirationPolicy {
        self.policy
    }

    /// Drop every entry expired by the policy. Returns how many went.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let expired = self.policy.is_expired(entry.written, entry.accessed, now);
            if expired {
                evicted += 1;
            }
            !expired
        });
        evicted
    }

    /// Run [`Self::evict_expired`] every `interval` until `shutdown` turns true.
    pub fn spawn_eviction_task(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                "Mute cache eviction task started"
            );
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = self.evict_expired();
                        if evicted > 0 {
                            debug!(
                                evicted,
                                remaining = self.entries.len(),
                                "Evicted expired mute cache entries"
                            );
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Mute cache eviction task stopped");
        })
    }

    fn entry_with(&self, future: MuteFuture, now: Timestamp) -> LoadingEntry {
        LoadingEntry {
            id: self.next_entry_id.fetch_add(1, Ordering::Relaxed),
            future,
            written: now,
            accessed: now,
        }
    }

    /// The live computation for `key`, starting one if needed.
    fn load(&self, key: MuteCacheKey) -> (u64, MuteFuture) {
        let now = self.clock.now();
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if self.policy.is_expired(entry.written, entry.accessed, now) {
                    *entry = self.entry_with(spawn_query(Arc::clone(&self.query), key), now);
                } else {
                    entry.accessed = now;
                }
                (entry.id, entry.future.clone())
            }
            Entry::Vacant(vacant) => {
                let future = spawn_query(Arc::clone(&self.query), key);
                let entry = vacant.insert(self.entry_with(future, now));
                (entry.id, entry.future.clone())
            }
        }
    }

    /// Replace a loaded value, keeping in-flight loads untouched.
    fn merge(&self, entry: &mut LoadingEntry, punishment: &Punishment) {
        let Some(existing) = entry.completed() else {
            return;
        };
        let merged = later_expiring(existing.clone(), punishment.clone());
        if existing.as_ref() != Some(&merged) {
            *entry = self.entry_with(ready(Some(merged)), self.clock.now());
        }
    }

    fn clear_where(&self, matches: impl Fn(&Punishment) -> bool) -> usize {
        let now = self.clock.now();
        let mut cleared = 0;
        for mut entry in self.entries.iter_mut() {
            if entry.completed().flatten().as_ref().is_some_and(&matches) {
                *entry = self.entry_with(ready(None), now);
                cleared += 1;
            }
        }
        cleared
    }
}

#[async_trait]
impl MuteCache for OnDemandMuteCache {
    async fn get_cached_mute(&self, key: MuteCacheKey) -> MuteValue {
        let now_secs = self.wall_clock.now_secs();
        for _ in 0..2 {
            let (id, future) = self.load(key);
            match future.await {
                Some(mute) if mute.is_expired(now_secs) => {
                    debug!(%key, punishment_id = mute.id, "Evicting expired mute");
                    self.entries.remove_if(&key, |_, entry| entry.id == id);
                }
                value => return value,
            }
        }
        None
    }

    fn on_login(&self, key: MuteCacheKey) -> Option<MuteFuture> {
        // A load still in flight started after this connection began.
        self.entries.remove_if(&key, |_, entry| entry.completed().is_some());
        None
    }

    fn set_cached_mute(&self, punishment: &Punishment) {
        if punishment.kind != PunishmentType::Mute {
            return;
        }
        for mut entry in self.entries.iter_mut() {
            if entry.key().is_covered_by(&punishment.victim) {
                self.merge(entry.value_mut(), punishment);
            }
        }
    }

    fn set_cached_mute_for(&self, key: MuteCacheKey, punishment: &Punishment) {
        if punishment.kind != PunishmentType::Mute {
            return;
        }
        if let Some(mut entry) = self.entries.get_mut(&key) {
            self.merge(entry.value_mut(), punishment);
        }
    }

    fn clear_cached_mute(&self, punishment: &Punishment) -> usize {
        let reference = punishment.reference();
        self.clear_where(|cached| cached.reference() == reference)
    }

    fn clear_cached_mute_by_id(&self, id: PunishmentId) -> usize {
        self.clear_where(|cached| cached.id == id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
