//! # MS-02 Mute Cache
//!
//! Answers "is this user muted" on every chat message and command without a
//! store round-trip. Two variants share the [`MuteCache`] port:
//!
//! - [`AlwaysAvailableMuteCache`]: an entry per online user, refreshed in
//!   the background, purged once the user has been offline past a grace
//!   period.
//! - [`OnDemandMuteCache`]: a loading cache filled on first read and expired
//!   after write or after access.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): cache key, mute values, shared futures
//! - **Ports Layer** (`ports/`)
//!   - `MuteCache`: driving port
//!   - `MuteQuery`, `OnlineRoster`, `MuteMessageFormatter`: driven ports
//! - **Caches**: `always_available.rs`, `on_demand.rs`
//! - **Checker** (`checker.rs`): turns a cached mute into a denial message
//!
//! ## Invariants
//!
//! - A completed refresh never loses to an older value.
//! - A direct update never replaces a refresh still in flight.
//! - Of two mutes for one key, the later-ending one is kept.
//! - Store failures read as "no mute"; they never reach the chat path.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod always_available;
pub mod checker;
pub mod config;
pub mod domain;
pub mod error;
mod loader;
pub mod on_demand;
pub mod ports;

/// Test doubles for the driven ports.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use always_available::AlwaysAvailableMuteCache;
pub use checker::MuteChecker;
pub use config::{CacheVariant, ExpirationPolicy, MuteCacheConfig};
pub use domain::{MuteCacheKey, MuteFuture, MuteValue};
pub use error::{CacheError, ConfigError};
pub use on_demand::OnDemandMuteCache;
pub use ports::{MuteCache, MuteMessageFormatter, MuteQuery, OnlineRoster};
