//! # Frame Publisher
//!
//! Defines the publishing side of the message bus.

use crate::frames::{BusFrame, ChannelFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing frames to the bus.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a frame to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the frame.
    async fn publish(&self, frame: BusFrame) -> usize;

    /// Get the total number of frames published.
    fn frames_published(&self) -> u64;
}

/// In-memory implementation of the message bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Every subscriber sees every frame, including frames it published itself;
/// loop prevention is the publisher's concern. Distributed deployments would
/// use a different implementation (e.g., Redis pub/sub).
pub struct InMemoryMessageBus {
    /// Broadcast sender for frames.
    sender: broadcast::Sender<BusFrame>,

    /// Total frames published.
    frames_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryMessageBus {
    /// Create a new in-memory bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            frames_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to frames matching a filter.
    ///
    /// Only frames published after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, filter: ChannelFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        debug!(channels = ?filter.channels, "New subscription created");
        Subscription::new(receiver, filter)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryMessageBus {
    async fn publish(&self, frame: BusFrame) -> usize {
        let channel = frame.channel.clone();
        let size = frame.len();

        // Always increment counter (frame was attempted)
        self.frames_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(frame) {
            Ok(receiver_count) => {
                debug!(
                    channel = %channel,
                    bytes = size,
                    receivers = receiver_count,
                    "Frame published"
                );
                receiver_count
            }
            Err(e) => {
                warn!(channel = %channel, error = %e, "Frame dropped (no receivers)");
                0
            }
        }
    }

    fn frames_published(&self) -> u64 {
        self.frames_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_no_subscribers() {
        let bus = InMemoryMessageBus::new();
        let receivers = bus.publish(BusFrame::new("sync", vec![1u8, 2])).await;
        assert_eq!(receivers, 0);
        assert_eq!(bus.frames_published(), 1);
    }

    #[tokio::test]
    async fn test_publish_with_subscribers() {
        let bus = InMemoryMessageBus::new();
        let _sub1 = bus.subscribe(ChannelFilter::all());
        let _sub2 = bus.subscribe(ChannelFilter::channels(["other"]));

        // Filtering happens on receipt, so both receivers count.
        let receivers = bus.publish(BusFrame::new("sync", vec![1u8])).await;
        assert_eq!(receivers, 2);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryMessageBus::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.frames_published(), 0);
    }

    #[test]
    fn test_custom_capacity() {
        let bus = InMemoryMessageBus::with_capacity(16);
        assert_eq!(bus.capacity(), 16);
    }
}
