//! Domain layer: cache keys, mute values and refresh futures.

pub mod key;
pub mod value;

pub use key::MuteCacheKey;
pub use value::{later_expiring, ready, unexpired, MuteFuture, MuteValue};
