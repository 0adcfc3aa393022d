//! Cache keys.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use shared_types::{UserId, Victim};

/// A connected user together with the address they connect from.
///
/// Address mutes apply per address, so both halves take part in lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MuteCacheKey {
    pub user: UserId,
    pub address: IpAddr,
}

impl MuteCacheKey {
    pub fn new(user: UserId, address: IpAddr) -> Self {
        Self { user, address }
    }

    /// Whether a punishment against `victim` covers this key.
    pub fn is_covered_by(&self, victim: &Victim) -> bool {
        victim.applies_to(self.user, self.address)
    }
}

impl fmt::Display for MuteCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.address)
    }
}
