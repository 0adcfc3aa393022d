//! Mute cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MIN_EXPIRATION_MS: u64 = 1_000;
const MIN_PURGE_INTERVAL_MS: u64 = 1_000;

/// Which cache implementation a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheVariant {
    /// Every online user has a cached value ready.
    #[default]
    AlwaysAvailable,
    /// Values are loaded on first use.
    OnDemand,
}

/// When an on-demand entry stops being trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationPolicy {
    /// Fixed time after the value was stored.
    Write(u64),
    /// Fixed time after the value was last read.
    Access(u64),
}

impl ExpirationPolicy {
    /// Whether an entry written at `written` and last read at `accessed` is
    /// expired at `now`. All three are monotonic milliseconds.
    pub fn is_expired(&self, written: u64, accessed: u64, now: u64) -> bool {
        match *self {
            Self::Write(ms) => now.saturating_sub(written) >= ms,
            Self::Access(ms) => now.saturating_sub(accessed) >= ms,
        }
    }
}

/// Mute cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuteCacheConfig {
    pub variant: CacheVariant,
    /// Age after which an always-available entry is refreshed, and the
    /// on-demand expiration window.
    pub expiration_ms: u64,
    /// On-demand only: measure expiration from write or from last access.
    pub expire_after_access: bool,
    /// Always-available only: delay between purge sweeps.
    pub purge_interval_ms: u64,
    /// Always-available only: how long an offline user's entry survives.
    pub grace_period_ms: u64,
}

impl Default for MuteCacheConfig {
    fn default() -> Self {
        Self {
            variant: CacheVariant::AlwaysAvailable,
            expiration_ms: 60_000,
            expire_after_access: false,
            purge_interval_ms: 60_000,
            grace_period_ms: 240_000,
        }
    }
}

impl MuteCacheConfig {
    #[must_use]
    pub fn with_variant(mut self, variant: CacheVariant) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub fn with_expiration_ms(mut self, expiration_ms: u64) -> Self {
        self.expiration_ms = expiration_ms;
        self
    }

    #[must_use]
    pub fn with_expire_after_access(mut self, after_access: bool) -> Self {
        self.expire_after_access = after_access;
        self
    }

    #[must_use]
    pub fn with_purge_interval_ms(mut self, purge_interval_ms: u64) -> Self {
        self.purge_interval_ms = purge_interval_ms;
        self
    }

    #[must_use]
    pub fn with_grace_period_ms(mut self, grace_period_ms: u64) -> Self {
        self.grace_period_ms = grace_period_ms;
        self
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_millis(self.purge_interval_ms)
    }

    pub fn expiration_policy(&self) -> ExpirationPolicy {
        if self.expire_after_access {
            ExpirationPolicy::Access(self.expiration_ms)
        } else {
            ExpirationPolicy::Write(self.expiration_ms)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expiration_ms < MIN_EXPIRATION_MS {
            return Err(ConfigError::TooShort {
                field: "expiration_ms",
                value_ms: self.expiration_ms,
                min_ms: MIN_EXPIRATION_MS,
            });
        }
        if self.purge_interval_ms < MIN_PURGE_INTERVAL_MS {
            return Err(ConfigError::TooShort {
                field: "purge_interval_ms",
                value_ms: self.purge_interval_ms,
                min_ms: MIN_PURGE_INTERVAL_MS,
            });
        }
        Ok(())
    }
}
