//! # Shared Types Crate
//!
//! Domain entities, errors and time sources shared by the synchronization
//! subsystem, the mute caches and the node runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Identity over content**: Packets and cache predicates refer to
//!   punishments by `PunishmentRef` (id + type); full details are always
//!   re-fetched from the shared store.
//! - **Injected time**: Nothing reads the clock directly; components take a
//!   `TimeSource` so tests can drive time.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod entities;
pub mod errors;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use time::{MockTimeSource, MonotonicTimeSource, SystemTimeSource, TimeSource, Timestamp};
