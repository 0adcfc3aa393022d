//! # Time Sources
//!
//! Abstracted to allow testing with deterministic time.
//!
//! - [`TimeSource`] is wall-clock time in milliseconds since the Unix epoch.
//!   Used for mailbox rows and punishment end-times.
//! - [`MonotonicTimeSource`] never goes backwards. Used for cache entry ages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Milliseconds, either since the Unix epoch or since a monotonic anchor.
pub type Timestamp = u64;

/// Time source for consistent timestamp handling.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;

    /// Returns the current time in whole seconds.
    fn now_secs(&self) -> i64 {
        i64::try_from(self.now() / 1000).unwrap_or(i64::MAX)
    }
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Timestamp::try_from(millis).unwrap_or(Timestamp::MAX)
    }
}

/// Monotonic time source measuring milliseconds since its creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTimeSource {
    anchor: Instant,
}

impl MonotonicTimeSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::try_from(self.anchor.elapsed().as_millis()).unwrap_or(Timestamp::MAX)
    }
}

/// Manually driven time source for tests.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    time: AtomicU64,
}

impl MockTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
