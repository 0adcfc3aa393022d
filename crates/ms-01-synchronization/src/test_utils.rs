//! Test doubles for the driven ports.
//!
//! Shared with the workspace integration tests.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    EnforcementError, EnforcementOptions, Operator, Punishment, PunishmentId, PunishmentRef,
    PunishmentType, ServerScope, StoreError, Timestamp, UnixSeconds, Victim,
};
use uuid::Uuid;

use crate::adapters::InMemoryMailbox;
use crate::ports::{LocalEnforcer, MailboxRow, MailboxStore, PunishmentSelector};

/// Build a punishment against a fresh composite victim.
pub fn make_punishment(id: PunishmentId, kind: PunishmentType, end: UnixSeconds) -> Punishment {
    Punishment {
        id,
        kind,
        victim: Victim::Composite(Uuid::new_v4(), IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))),
        operator: Operator::Console,
        reason: format!("test {kind} {id}"),
        scope: ServerScope::Global,
        start: 1_000,
        end,
    }
}

/// Selector backed by a map, counting every fetch.
#[derive(Default)]
pub struct InMemorySelector {
    punishments: Mutex<HashMap<(PunishmentId, PunishmentType), Punishment>>,
    fetches: AtomicUsize,
    failure: Mutex<Option<StoreError>>,
}

impl InMemorySelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(punishments: impl IntoIterator<Item = Punishment>) -> Self {
        let selector = Self::new();
        for p in punishments {
            selector.insert(p);
        }
        selector
    }

    pub fn insert(&self, punishment: Punishment) {
        self.punishments
            .lock()
            .insert((punishment.id, punishment.kind), punishment);
    }

    pub fn remove(&self, id: PunishmentId, kind: PunishmentType) {
        self.punishments.lock().remove(&(id, kind));
    }

    /// Make every following fetch fail.
    pub fn fail_with(&self, error: StoreError) {
        *self.failure.lock() = Some(error);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PunishmentSelector for InMemorySelector {
    async fn fetch_by_id_and_type(
        &self,
        id: PunishmentId,
        kind: PunishmentType,
    ) -> Result<Option<Punishment>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        Ok(self.punishments.lock().get(&(id, kind)).cloned())
    }
}

/// One recorded call to a [`LocalEnforcer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcerCall {
    Enforce(Punishment),
    Unenforce(Punishment),
    UnenforceById(PunishmentRef),
    ClearExpunged(PunishmentId),
    RefreshDetails(PunishmentId),
}

/// Enforcer recording every call in order.
#[derive(Default)]
pub struct RecordingEnforcer {
    calls: Mutex<Vec<EnforcerCall>>,
    options: Mutex<Vec<EnforcementOptions>>,
}

impl RecordingEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EnforcerCall> {
        self.calls.lock().clone()
    }

    pub fn last_options(&self) -> Option<EnforcementOptions> {
        self.options.lock().last().cloned()
    }

    fn record(&self, call: EnforcerCall, options: Option<&EnforcementOptions>) {
        self.calls.lock().push(call);
        if let Some(options) = options {
            self.options.lock().push(options.clone());
        }
    }
}

#[async_trait]
impl LocalEnforcer for RecordingEnforcer {
    async fn enforce_locally(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        self.record(EnforcerCall::Enforce(punishment.clone()), Some(options));
        Ok(())
    }

    async fn unenforce_locally(
        &self,
        punishment: &Punishment,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        self.record(EnforcerCall::Unenforce(punishment.clone()), Some(options));
        Ok(())
    }

    async fn unenforce_by_id_locally(
        &self,
        reference: PunishmentRef,
        options: &EnforcementOptions,
    ) -> Result<(), EnforcementError> {
        self.record(EnforcerCall::UnenforceById(reference), Some(options));
        Ok(())
    }

    async fn clear_expunged_locally(&self, id: PunishmentId) -> Result<(), EnforcementError> {
        self.record(EnforcerCall::ClearExpunged(id), None);
        Ok(())
    }

    async fn refresh_details_locally(&self, id: PunishmentId) -> Result<(), EnforcementError> {
        self.record(EnforcerCall::RefreshDetails(id), None);
        Ok(())
    }
}

/// Mailbox whose reads can be made to fail.
pub struct FlakyMailbox {
    inner: Arc<InMemoryMailbox>,
    failing: AtomicBool,
}

impl FlakyMailbox {
    pub fn new(inner: Arc<InMemoryMailbox>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailboxStore for FlakyMailbox {
    async fn insert(&self, row: MailboxRow) -> Result<(), StoreError> {
        self.inner.insert(row).await
    }

    async fn select_between(
        &self,
        after: Timestamp,
        up_to: Timestamp,
    ) -> Result<Vec<MailboxRow>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("mailbox offline".to_string()));
        }
        self.inner.select_between(after, up_to).await
    }
}
