//! # Adapters
//!
//! Port implementations owned by the composition root.
//!
//! - `cache_aware` - keeps the mute cache in step with local enforcement
//! - `memory` - in-memory store and platform backends

pub mod cache_aware;
pub mod memory;

pub use cache_aware::CacheAwareEnforcer;
pub use memory::{ConnectedUsers, InMemoryPunishmentStore, LoggingPlatform, PlainDenialFormatter};
