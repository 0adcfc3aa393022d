//! # Bus Frames
//!
//! The unit carried by the bus: an opaque payload published on a named
//! channel. The bus never inspects payloads; encoding belongs to the
//! publishing subsystem.

use bytes::Bytes;

/// A published payload and the channel it was published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusFrame {
    /// Channel name, e.g. [`SYNC_CHANNEL`](crate::SYNC_CHANNEL).
    pub channel: String,
    /// Opaque encoded payload.
    pub payload: Bytes,
}

impl BusFrame {
    /// Create a frame for a channel.
    pub fn new(channel: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Filter for subscribing to specific channels.
#[derive(Debug, Clone, Default)]
pub struct ChannelFilter {
    /// Channels to include. Empty means all channels.
    pub channels: Vec<String>,
}

impl ChannelFilter {
    /// Create a filter that accepts all frames.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific channels.
    #[must_use]
    pub fn channels<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a frame matches this filter.
    #[must_use]
    pub fn matches(&self, frame: &BusFrame) -> bool {
        self.channels.is_empty() || self.channels.iter().any(|c| *c == frame.channel)
    }
}
