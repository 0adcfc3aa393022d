//! Always-Available mute cache
//!
//! Every online user has an entry holding the last known mute, so the chat
//! path answers without waiting on the store. Entries move through
//!
//! ```text
//! absent --login--> refreshing --complete--> fresh --stale--> refreshing
//! ```
//!
//! A completed refresh is folded into the current value the next time any
//! operation touches the entry. All mutations run inside the map's per-key
//! critical section.

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

use crate::config::MuteCacheConfig;
use crate::domain::{later_expiring, ready, unexpired, MuteCacheKey, MuteFuture, MuteValue};
use crate::loader::{query_once, spawn_query};
use crate::ports::{MuteCache, MuteQuery, OnlineRoster};

struct CacheEntry {
    /// Distinguishes this entry from a later one under the same key.
    id: u64,
    current: MuteValue,
    /// Monotonic time the last refresh started.
    last_updated: Timestamp,
    next: Option<MuteFuture>,
}

impl CacheEntry {
    /// Move a completed refresh into `current`.
    fn fold_completed(&mut self) {
        let completed = self.next.as_ref().and_then(|next| next.peek().cloned());
        if let Some(value) = completed {
            self.current = value;
            self.next = None;
        }
    }

    fn start_refresh(&mut self, query: &Arc<dyn MuteQuery>, key: MuteCacheKey, now: Timestamp) {
        self.next = Some(spawn_query(Arc::clone(query), key));
        self.last_updated = now;
    }

    /// Merge an enacted mute unless a refresh is in flight.
    fn merge(&mut self, punishment: &Punishment) -> bool {
        self.fold_completed();
        if self.next.is_some() {
            return false;
        }
        self.current = Some(later_expiring(self.current.take(), punishment.clone()));
        true
    }
}

/// Mute cache with a ready answer for every online user.
pub struct AlwaysAvailableMuteCache {
    entries: DashMap<MuteCacheKey, CacheEntry>,
    query: Arc<dyn MuteQuery>,
    roster: Arc<dyn OnlineRoster>,
    /// Monotonic, for entry ages.
    clock: Arc<dyn TimeSource>,
    /// Wall clock, for punishment end-times.
    wall_clock: Arc<dyn TimeSource>,
    expiration_ms: u64,
    grace_period_ms: u64,
    next_entry_id: AtomicU64,
}

impl AlwaysAvailableMuteCache {
    pub fn new(
        query: Arc<dyn MuteQuery>,
        roster: Arc<dyn OnlineRoster>,
        config: &MuteCacheConfig,
    ) -> Self {
        Self::with_clocks(
            query,
            roster,
            config,
            Arc::new(MonotonicTimeSource::new()),
            Arc::new(SystemTimeSource),
        )
    }

    pub fn with_clocks(
        query: Arc<dyn MuteQuery>,
        roster: Arc<dyn OnlineRoster>,
        config: &MuteCacheConfig,
        clock: Arc<dyn TimeSource>,
        wall_clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            query,
            roster,
            clock,
            wall_clock,
            expiration_ms: config.expiration_ms,
            grace_period_ms: config.grace_period_ms,
            next_entry_id: AtomicU64::new(0),
        }
    }

    pub fn contains(&self, key: &MuteCacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// The refresh currently in flight for `key`, if any.
    pub fn refresh_handle(&self, key: &MuteCacheKey) -> Option<MuteFuture> {
        let mut entry = self.entries.get_mut(key)?;
        entry.fold_completed();
        entry.next.clone()
    }

    /// Remove entries of offline users not refreshed within the grace period.
    ///
    /// Returns the number of entries removed.
    pub fn purge_offline(&self) -> usize {
        let now = self.clock.now();
        let grace = self.grace_period_ms;
        let candidates: Vec<(MuteCacheKey, u64)> = self
            .entries
            .iter()
            .filter(|entry| now.saturating_sub(entry.last_updated) > grace)
            .map(|entry| (*entry.key(), entry.id))
            .collect();

        let mut removed = 0;
        for (key, id) in candidates {
            if self.roster.is_online(key.user) {
                continue;
            }
            let purged = self.entries.remove_if(&key, |_, entry| {
                entry.id == id && now.saturating_sub(entry.last_updated) > grace
            });
            if purged.is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Purged offline mute cache entries");
        }
        removed
    }

    /// Run [`Self::purge_offline`] every `interval` until `shutdown` turns true.
    pub fn spawn_purge_task(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                "Mute cache purge task started"
            );
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.purge_offline();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Mute cache purge task stopped");
        })
    }

    fn clear_where(&self, matches: impl Fn(&Punishment) -> bool) -> usize {
        let mut cleared = 0;
        for mut entry in self.entries.iter_mut() {
            entry.fold_completed();
            if entry.current.as_ref().is_some_and(&matches) {
                entry.current = None;
                cleared += 1;
            }
        }
        cleared
    }

    fn new_entry_id(&self) -> u64 {
        self.next_entry_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl MuteCache for AlwaysAvailableMuteCache {
    async fn get_cached_mute(&self, key: MuteCacheKey) -> MuteValue {
        let now = self.clock.now();
        let now_secs = self.wall_clock.now_secs();

        let cached = self.entries.get_mut(&key).map(|mut entry| {
            entry.fold_completed();
            let expired = entry
                .current
                .as_ref()
                .is_some_and(|mute| mute.is_expired(now_secs));
            let stale = now.saturating_sub(entry.last_updated) > self.expiration_ms;
            if (stale || expired) && entry.next.is_none() {
                entry.start_refresh(&self.query, key, now);
            }
            if expired {
                None
            } else {
                entry.current.clone()
            }
        });

        match cached {
            Some(value) => value,
            // Not marked online: answer without creating an entry.
            None => query_once(self.query.as_ref(), key)
                .await
                .filter(|mute| !mute.is_expired(now_secs)),
        }
    }

    fn on_login(&self, key: MuteCacheKey) -> Option<MuteFuture> {
        let now = self.clock.now();
        let now_secs = self.wall_clock.now_secs();
        let future = match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.fold_completed();
                let expired = entry
                    .current
                    .as_ref()
                    .is_some_and(|mute| mute.is_expired(now_secs));
                let stale = now.saturating_sub(entry.last_updated) > self.expiration_ms;
                if entry.next.is_none() && (stale || expired) {
                    entry.start_refresh(&self.query, key, now);
                }
                match &entry.next {
                    Some(next) => unexpired(next.clone(), now_secs),
                    None => ready(entry.current.clone()),
                }
            }
            Entry::Vacant(vacant) => {
                let next = spawn_query(Arc::clone(&self.query), key);
                vacant.insert(CacheEntry {
                    id: self.new_entry_id(),
                    current: None,
                    last_updated: now,
                    next: Some(next.clone()),
                });
                next
            }
        };
        Some(future)
    }

    fn set_cached_mute(&self, punishment: &Punishment) {
        if punishment.kind != PunishmentType::Mute {
            return;
        }
        for mut entry in self.entries.iter_mut() {
            if entry.key().is_covered_by(&punishment.victim) && !entry.merge(punishment) {
                debug!(
                    key = %entry.key(),
                    punishment_id = punishment.id,
                    "Refresh in flight, not merging mute"
                );
            }
        }
    }

    fn set_cached_mute_for(&self, key: MuteCacheKey, punishment: &Punishment) {
        if punishment.kind != PunishmentType::Mute {
            return;
        }
        if let Some(mut entry) = self.entries.get_mut(&key) {
            entry.merge(punishment);
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
