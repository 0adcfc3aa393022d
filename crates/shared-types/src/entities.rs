//! # Core Domain Entities
//!
//! Punishment identity and the values exchanged between the synchronization
//! subsystem, the mute caches, and the platform layer.
//!
//! ## Clusters
//!
//! - **Identity**: `PunishmentId`, `PunishmentType`, `UserId`
//! - **Punishment**: `Punishment`, `Victim`, `Operator`, `ServerScope`
//! - **Enforcement**: `EnforcementMode`, `EnforcementOptions`, `Enforcement`,
//!   `BroadcastingPolicy`

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Stable numeric identifier assigned by the shared store.
pub type PunishmentId = i64;

/// A user's unique identifier.
pub type UserId = Uuid;

/// Unix timestamp in seconds, used for punishment start and end.
pub type UnixSeconds = i64;

/// Kind of punishment.
///
/// The discriminant is the wire ordinal and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PunishmentType {
    Ban = 0,
    Mute = 1,
    Warn = 2,
    Kick = 3,
}

impl PunishmentType {
    /// All types, ordered by ordinal.
    pub const ALL: [PunishmentType; 4] = [Self::Ban, Self::Mute, Self::Warn, Self::Kick];

    /// Wire ordinal.
    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Inverse of [`PunishmentType::ordinal`].
    #[must_use]
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }
}

impl std::fmt::Display for PunishmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ban => "ban",
            Self::Mute => "mute",
            Self::Warn => "warn",
            Self::Kick => "kick",
        };
        f.write_str(name)
    }
}

// =============================================================================
// CLUSTER B: PUNISHMENT
// =============================================================================

/// Who or what a punishment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Victim {
    /// A single user, wherever they connect from.
    Player(UserId),
    /// Every user connecting from an address.
    Address(IpAddr),
    /// A user, and also anyone connecting from the given address.
    Composite(UserId, IpAddr),
}

impl Victim {
    /// Whether a user connecting from `address` is covered by this victim.
    #[must_use]
    pub fn applies_to(&self, user: UserId, address: IpAddr) -> bool {
        match *self {
            Self::Player(uuid) => uuid == user,
            Self::Address(addr) => addr == address,
            Self::Composite(uuid, addr) => uuid == user || addr == address,
        }
    }
}

/// The staff member responsible for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Console,
    Player(UserId),
}

impl Operator {
    /// Identifier used on the wire; the console is the nil UUID.
    #[must_use]
    pub fn to_uuid(self) -> Uuid {
        match self {
            Self::Console => Uuid::nil(),
            Self::Player(uuid) => uuid,
        }
    }

    /// Inverse of [`Operator::to_uuid`].
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        if uuid.is_nil() {
            Self::Console
        } else {
            Self::Player(uuid)
        }
    }
}

/// Servers on which a punishment applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ServerScope {
    #[default]
    Global,
    Server(String),
    Category(String),
}

/// A punishment as held by the shared store.
///
/// The synchronization core only needs `id` and `kind`; the remaining fields
/// are carried for enforcement and for rendering denial messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Punishment {
    pub id: PunishmentId,
    pub kind: PunishmentType,
    pub victim: Victim,
    pub operator: Operator,
    pub reason: String,
    pub scope: ServerScope,
    /// Start time, Unix seconds.
    pub start: UnixSeconds,
    /// End time, Unix seconds. Zero means permanent.
    pub end: UnixSeconds,
}

impl Punishment {
    /// Whether the punishment never ends.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.end == 0
    }

    /// Whether the punishment has ended at wall-clock time `now`.
    #[must_use]
    pub fn is_expired(&self, now: UnixSeconds) -> bool {
        !self.is_permanent() && self.end <= now
    }

    /// Whether this punishment ends strictly later than `other`.
    ///
    /// Permanent punishments end later than any temporary one.
    #[must_use]
    pub fn ends_later_than(&self, other: &Punishment) -> bool {
        match (self.is_permanent(), other.is_permanent()) {
            (true, true) | (false, true) => false,
            (true, false) => true,
            (false, false) => self.end > other.end,
        }
    }

    /// Identity reference used by packets and cache predicates.
    #[must_use]
    pub fn reference(&self) -> PunishmentRef {
        PunishmentRef {
            id: self.id,
            kind: self.kind,
        }
    }
}

/// The minimal identity of a punishment: identifier plus type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PunishmentRef {
    pub id: PunishmentId,
    pub kind: PunishmentType,
}

impl std::fmt::Display for PunishmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

// =============================================================================
// CLUSTER C: ENFORCEMENT
// =============================================================================

/// Whether a change applies or lifts a punishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnforcementMode {
    Do,
    Undo,
}

/// How far enforcement of a change should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Enforcement {
    /// Enforce here and notify every other process.
    #[default]
    Global,
    /// Enforce only on the process handling the change.
    SingleServerOnly,
    /// Record the change without enforcing it.
    None,
}

/// How a change is announced to staff and users.
///
/// The discriminant is the wire ordinal and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum BroadcastingPolicy {
    #[default]
    Normal = 0,
    Silent = 1,
    None = 2,
}

impl BroadcastingPolicy {
    pub const ALL: [BroadcastingPolicy; 3] = [Self::Normal, Self::Silent, Self::None];

    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }
}

/// Options accompanying an enforcement or un-enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct EnforcementOptions {
    pub enforcement: Enforcement,
    pub broadcasting: BroadcastingPolicy,
    /// The argument the operator typed to name the target, if any.
    ///
    /// Never empty when present; an empty string on the wire means absent.
    pub target_argument: Option<String>,
    /// The operator lifting the punishment, when it differs from the original.
    pub unenforcement_operator: Option<Operator>,
}

impl EnforcementOptions {
    /// Options for a change that is enforced everywhere and announced normally.
    #[must_use]
    pub fn global() -> Self {
        Self::default()
    }

    /// Builder-style method to set enforcement reach.
    #[must_use]
    pub fn with_enforcement(mut self, enforcement: Enforcement) -> Self {
        self.enforcement = enforcement;
        self
    }

    /// Builder-style method to set broadcasting.
    #[must_use]
    pub fn with_broadcasting(mut self, broadcasting: BroadcastingPolicy) -> Self {
        self.broadcasting = broadcasting;
        self
    }

    /// Builder-style method to set the target argument.
    ///
    /// An empty argument is normalised to absent.
    #[must_use]
    pub fn with_target_argument(mut self, argument: impl Into<String>) -> Self {
        let argument = argument.into();
        self.target_argument = (!argument.is_empty()).then_some(argument);
        self
    }

    /// Builder-style method to set the un-enforcing operator.
    #[must_use]
    pub fn with_unenforcement_operator(mut self, operator: Operator) -> Self {
        self.unenforcement_operator = Some(operator);
        self
    }
}

/// A denial message rendered by the platform for a muted user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderedMessage(pub String);

impl RenderedMessage {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RenderedMessage {
    fn from(value: String) -> Self {
        Self(value)
    }
}
