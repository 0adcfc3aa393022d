//! # Shared Bus - Message Bus for Inter-Process Notifications
//!
//! A broadcast bus carrying opaque byte frames on named channels. It is the
//! medium behind the push-based synchronization transport: a process
//! publishes an encoded envelope, every other subscribed process drains it on
//! its next poll.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Process A   │                    │  Process B   │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │ Message Bus  │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - At-most-once: a subscriber that falls more than `capacity` frames behind
//!   loses the oldest frames (counted in [`Subscription::lagged`]).
//! - Publishers receive their own frames; the bus does not filter by origin.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod frames;
pub mod publisher;
pub mod subscriber;

pub use frames::{BusFrame, ChannelFilter};
pub use publisher::{InMemoryMessageBus, MessagePublisher};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum frames to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Channel carrying moderation synchronization envelopes.
pub const SYNC_CHANNEL: &str = "moderation.sync";
