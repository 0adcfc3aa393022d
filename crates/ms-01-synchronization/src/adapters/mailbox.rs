//! Mailbox transport
//!
//! Every process appends envelopes to one shared, timestamped table and reads
//! the rows inserted since its previous poll. Rows are never deleted by
//! readers, so any number of processes can watch the same table.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use shared_types::{StoreError, TimeSource, Timestamp};
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::ports::{MailboxRow, MailboxStore, SyncTransport};

/// Transport over a [`MailboxStore`].
///
/// The poll cursor is private to this instance. It moves to `now` after every
/// poll past the baseline, whether or not the read succeeded.
pub struct MailboxTransport {
    store: Arc<dyn MailboxStore>,
    clock: Arc<dyn TimeSource>,
    last_poll: Mutex<Option<Timestamp>>,
}

impl MailboxTransport {
    pub fn new(store: Arc<dyn MailboxStore>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            store,
            clock,
            last_poll: Mutex::new(None),
        }
    }

    /// The upper bound of the last polled window, if a baseline exists.
    pub fn last_poll(&self) -> Option<Timestamp> {
        *self.last_poll.lock()
    }

    /// Claim the window `(previous, now]`, moving the cursor to `now`.
    ///
    /// `None` on the first poll, and when the clock has not moved past the
    /// cursor.
    fn claim_window(&self, now: Timestamp) -> Option<(Timestamp, Timestamp)> {
        let mut cursor = self.last_poll.lock();
        match *cursor {
            None => {
                *cursor = Some(now);
                None
            }
            Some(previous) if now <= previous => None,
            Some(previous) => {
                *cursor = Some(now);
                Some((previous, now))
            }
        }
    }
}

#[async_trait]
impl SyncTransport for MailboxTransport {
    async fn dispatch(&self, message: Bytes) -> Result<(), SyncError> {
        let row = MailboxRow {
            message,
            time: self.clock.now(),
        };
        self.store.insert(row).await?;
        Ok(())
    }

    async fn poll(&self) -> Result<Vec<Bytes>, SyncError> {
        let now = self.clock.now();
        let Some((after, up_to)) = self.claim_window(now) else {
            return Ok(Vec::new());
        };

        match self.store.select_between(after, up_to).await {
            Ok(rows) => {
                if !rows.is_empty() {
                    debug!(count = rows.len(), after, up_to, "Read mailbox rows");
                }
                Ok(rows.into_iter().map(|row| row.message).collect())
            }
            Err(e) => {
                warn!(
                    error = %e,
                    skipped_after = after,
                    skipped_up_to = up_to,
                    "Mailbox poll failed; messages in this window will not be read"
                );
                Err(e.into())
            }
        }
    }
}

/// Mailbox table held in memory.
///
/// Shared between transports in the same process to simulate several nodes
/// on one store.
#[derive(Default)]
pub struct InMemoryMailbox {
    rows: RwLock<Vec<MailboxRow>>,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Drop rows older than `cutoff`. Returns how many were removed.
    pub fn prune_before(&self, cutoff: Timestamp) -> usize {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| row.time >= cutoff);
        before - rows.len()
    }
}

#[async_trait]
impl MailboxStore for InMemoryMailbox {
    async fn insert(&self, row: MailboxRow) -> Result<(), StoreError> {
        self.rows.write().push(row);
        Ok(())
    }

    async fn select_between(
        &self,
        after: Timestamp,
        up_to: Timestamp,
    ) -> Result<Vec<MailboxRow>, StoreError> {
        let mut selected: Vec<MailboxRow> = self
            .rows
            .read()
            .iter()
            .filter(|row| row.time > after && row.time <= up_to)
            .cloned()
            .collect();
        selected.sort_by_key(|row| row.time);
        Ok(selected)
    }
}
