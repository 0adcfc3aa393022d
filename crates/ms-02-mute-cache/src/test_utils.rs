//! Test doubles for the mute cache ports.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    Operator, Punishment, PunishmentId, PunishmentType, RenderedMessage, ServerScope, StoreError,
    UnixSeconds, UserId, Victim,
};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::domain::MuteCacheKey;
use crate::ports::{MuteMessageFormatter, MuteQuery, OnlineRoster};

/// A key with a fresh user on a documentation address.
pub fn make_key() -> MuteCacheKey {
    MuteCacheKey::new(Uuid::new_v4(), IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7)))
}

/// A mute against a fresh user.
pub fn make_mute(id: PunishmentId, end: UnixSeconds) -> Punishment {
    make_mute_for(id, &make_key(), end)
}

/// A mute against the user of `key`.
pub fn make_mute_for(id: PunishmentId, key: &MuteCacheKey, end: UnixSeconds) -> Punishment {
    Punishment {
        id,
        kind: PunishmentType::Mute,
        victim: Victim::Player(key.user),
        operator: Operator::Console,
        reason: "spam".to_string(),
        scope: ServerScope::Global,
        start: 0,
        end,
    }
}

/// Query answering from a per-user table, optionally held behind a gate.
#[derive(Default)]
pub struct ScriptedMuteQuery {
    mutes: Mutex<HashMap<UserId, Punishment>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedMuteQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query waits for a permit from [`ScriptedMuteQuery::release`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub fn release(&self, queries: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(queries);
        }
    }

    pub fn set(&self, user: UserId, mute: Punishment) {
        self.mutes.lock().insert(user, mute);
    }

    pub fn remove(&self, user: UserId) {
        self.mutes.lock().remove(&user);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MuteQuery for ScriptedMuteQuery {
    async fn query_applicable_mute(
        &self,
        key: MuteCacheKey,
    ) -> Result<Option<Punishment>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout { millis: 5_000 });
        }
        Ok(self.mutes.lock().get(&key.user).cloned())
    }
}

/// Roster backed by a set of online users.
#[derive(Default)]
pub struct StaticRoster {
    online: Mutex<HashSet<UserId>>,
}

impl StaticRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, user: UserId, online: bool) {
        let mut set = self.online.lock();
        if online {
            set.insert(user);
        } else {
            set.remove(&user);
        }
    }
}

impl OnlineRoster for StaticRoster {
    fn is_online(&self, user: UserId) -> bool {
        self.online.lock().contains(&user)
    }
}

/// Formatter producing `"muted: <reason>"`.
pub struct PlainFormatter;

#[async_trait]
impl MuteMessageFormatter for PlainFormatter {
    async fn render_denial(&self, punishment: &Punishment) -> RenderedMessage {
        RenderedMessage(format!("muted: {}", punishment.reason))
    }
}
