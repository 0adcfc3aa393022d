//! Bus transport
//!
//! Pushes envelopes straight to every subscribed process over the shared
//! message bus. Frames buffer in this process's subscription until the next
//! poll drains them.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use shared_bus::{
    BusFrame, ChannelFilter, InMemoryMessageBus, MessagePublisher, Subscription, SYNC_CHANNEL,
};
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::ports::SyncTransport;

/// Transport over the `moderation.sync` bus channel.
///
/// The bus echoes frames back to their publisher; the protocol layer drops
/// those by instance ID.
pub struct BusTransport {
    publisher: Arc<dyn MessagePublisher>,
    subscription: Mutex<Subscription>,
    lagged_seen: Mutex<u64>,
}

impl BusTransport {
    /// Subscribe to the sync channel of `bus`.
    ///
    /// Only frames published after this call are delivered.
    pub fn new(bus: Arc<InMemoryMessageBus>) -> Self {
        let subscription = bus.subscribe(ChannelFilter::channels([SYNC_CHANNEL]));
        Self {
            publisher: bus,
            subscription: Mutex::new(subscription),
            lagged_seen: Mutex::new(0),
        }
    }

    /// Frames lost so far because this process polled too slowly.
    pub fn lagged(&self) -> u64 {
        self.subscription.lock().lagged()
    }
}

#[async_trait]
impl SyncTransport for BusTransport {
    async fn dispatch(&self, message: Bytes) -> Result<(), SyncError> {
        let receivers = self
            .publisher
            .publish(BusFrame::new(SYNC_CHANNEL, message))
            .await;
        debug!(receivers, "Dispatched sync frame");
        Ok(())
    }

    async fn poll(&self) -> Result<Vec<Bytes>, SyncError> {
        let (frames, lagged) = {
            let mut subscription = self.subscription.lock();
            let frames = subscription.drain();
            (frames, subscription.lagged())
        };

        let mut seen = self.lagged_seen.lock();
        if lagged > *seen {
            warn!(
                dropped = lagged - *seen,
                "Sync frames dropped before this process could poll them"
            );
            *seen = lagged;
        }

        Ok(frames.into_iter().map(|frame| frame.payload).collect())
    }
}
