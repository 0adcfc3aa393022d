//! # Frame Subscriber
//!
//! Defines the subscription side of the message bus.

use crate::frames::{BusFrame, ChannelFilter};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The message bus was closed.
    #[error("Message bus closed")]
    Closed,
}

/// A subscription handle for receiving frames.
pub struct Subscription {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<BusFrame>,

    /// Filter for this subscription.
    filter: ChannelFilter,

    /// Frames lost because this subscriber fell behind.
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<BusFrame>, filter: ChannelFilter) -> Self {
        Self {
            receiver,
            filter,
            lagged: 0,
        }
    }

    /// Try to receive the next frame without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(frame))` - A frame was available and matched
    /// - `Ok(None)` - No frame available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<BusFrame>, SubscriptionError> {
        loop {
            let frame = match self.receiver.try_recv() {
                Ok(f) => f,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.record_lag(count);
                    continue;
                }
            };

            if self.filter.matches(&frame) {
                return Ok(Some(frame));
            }
        }
    }

    /// Take every matching frame currently buffered, without blocking.
    ///
    /// A closed bus yields whatever was buffered before closing.
    pub fn drain(&mut self) -> Vec<BusFrame> {
        let mut frames = Vec::new();
        while let Ok(Some(frame)) = self.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Total frames this subscriber missed by falling behind.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    fn record_lag(&mut self, count: u64) {
        self.lagged = self.lagged.saturating_add(count);
        warn!(lagged = count, "Subscriber lagged, some frames dropped");
    }
}
