//! Protocol packets
//!
//! One immutable value per kind of change notification. Each packet knows its
//! one-byte discriminant and how to write and read its fields in a fixed
//! order. Packets carry identity only; receivers re-fetch details from the
//! shared store when they need them.

use bytes::{Buf, BufMut};
use shared_types::{
    BroadcastingPolicy, EnforcementMode, EnforcementOptions, Operator, PunishmentId,
    PunishmentRef, PunishmentType,
};

use super::wire;
use crate::error::{DecodeError, EncodeError};

/// A change notification exchanged between processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    EnforceOrUnenforce(EnforceUnenforcePacket),
    Expunge(ExpungePacket),
    UpdateDetails(UpdateDetailsPacket),
}

impl Packet {
    pub const ENFORCE_UNENFORCE: u8 = 1;
    pub const EXPUNGE: u8 = 2;
    pub const UPDATE_DETAILS: u8 = 3;

    /// One-byte type discriminant written before the packet fields.
    #[must_use]
    pub fn discriminant(&self) -> u8 {
        match self {
            Self::EnforceOrUnenforce(_) => Self::ENFORCE_UNENFORCE,
            Self::Expunge(_) => Self::EXPUNGE,
            Self::UpdateDetails(_) => Self::UPDATE_DETAILS,
        }
    }

    /// The punishment this packet is about.
    #[must_use]
    pub fn punishment_id(&self) -> PunishmentId {
        match self {
            Self::EnforceOrUnenforce(p) => p.id,
            Self::Expunge(p) => p.id,
            Self::UpdateDetails(p) => p.id,
        }
    }

    /// Write the discriminant followed by the packet fields.
    pub fn write_to(&self, buf: &mut impl BufMut) -> Result<(), EncodeError> {
        wire::put_u8(buf, self.discriminant());
        match self {
            Self::EnforceOrUnenforce(p) => p.write_to(buf),
            Self::Expunge(p) => {
                p.write_to(buf);
                Ok(())
            }
            Self::UpdateDetails(p) => {
                p.write_to(buf);
                Ok(())
            }
        }
    }

    /// Read a discriminant and dispatch to the matching packet parser.
    pub fn read_from(buf: &mut impl Buf) -> Result<Self, DecodeError> {
        match wire::get_u8(buf, "packet_type")? {
            Self::ENFORCE_UNENFORCE => {
                EnforceUnenforcePacket::read_from(buf).map(Self::EnforceOrUnenforce)
            }
            Self::EXPUNGE => ExpungePacket::read_from(buf).map(Self::Expunge),
            Self::UPDATE_DETAILS => {
                UpdateDetailsPacket::read_from(buf).map(Self::UpdateDetails)
            }
            other => Err(DecodeError::UnknownPacketType(other)),
        }
    }
}

/// Apply or lift enforcement of a punishment.
///
/// Reason and duration are left out to keep the message small; the receiver
/// fetches the punishment when it needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforceUnenforcePacket {
    pub id: PunishmentId,
    pub kind: PunishmentType,
    pub mode: EnforcementMode,
    pub broadcasting: BroadcastingPolicy,
    pub target_argument: Option<String>,
    pub unenforcement_operator: Option<Operator>,
}

impl EnforceUnenforcePacket {
    /// Build from a punishment reference and the options of the change.
    #[must_use]
    pub fn new(
        reference: PunishmentRef,
        mode: EnforcementMode,
        options: &EnforcementOptions,
    ) -> Self {
        Self {
            id: reference.id,
            kind: reference.kind,
            mode,
            broadcasting: options.broadcasting,
            target_argument: options.target_argument.clone().filter(|a| !a.is_empty()),
            unenforcement_operator: options.unenforcement_operator,
        }
    }

    #[must_use]
    pub fn reference(&self) -> PunishmentRef {
        PunishmentRef {
            id: self.id,
            kind: self.kind,
        }
    }

    /// Options for the receiving side's local, non-broadcasting enforcement.
    #[must_use]
    pub fn local_options(&self) -> EnforcementOptions {
        EnforcementOptions {
            enforcement: shared_types::Enforcement::SingleServerOnly,
            broadcasting: self.broadcasting,
            target_argument: self.target_argument.clone(),
            unenforcement_operator: self.unenforcement_operator,
        }
    }

    fn write_to(&self, buf: &mut impl BufMut) -> Result<(), EncodeError> {
        wire::put_i64(buf, self.id);
        wire::put_u8(buf, self.kind.ordinal());
        wire::put_bool(buf, self.mode == EnforcementMode::Do);
        wire::put_u8(buf, self.broadcasting.ordinal());
        wire::put_string(
            buf,
            "target_argument",
            self.target_argument.as_deref().unwrap_or_default(),
        )?;
        match self.unenforcement_operator {
            Some(operator) => {
                wire::put_bool(buf, true);
                wire::put_uuid(buf, operator.to_uuid());
            }
            None => wire::put_bool(buf, false),
        }
        Ok(())
    }

    fn read_from(buf: &mut impl Buf) -> Result<Self, DecodeError> {
        let id = wire::get_i64(buf, "id")?;
        let kind_ordinal = wire::get_u8(buf, "type")?;
        let kind = PunishmentType::from_ordinal(kind_ordinal).ok_or(DecodeError::UnknownOrdinal {
            field: "type",
            value: kind_ordinal,
        })?;
        let mode = if wire::get_bool(buf, "mode")? {
            EnforcementMode::Do
        } else {
            EnforcementMode::Undo
        };
        let broadcast_ordinal = wire::get_u8(buf, "broadcasting")?;
        let broadcasting = BroadcastingPolicy::from_ordinal(broadcast_ordinal).ok_or(
            DecodeError::UnknownOrdinal {
                field: "broadcasting",
                value: broadcast_ordinal,
            },
        )?;
        let target_argument =
            Some(wire::get_string(buf, "target_argument")?).filter(|a| !a.is_empty());
        let unenforcement_operator = if wire::get_bool(buf, "has_operator")? {
            Some(Operator::from_uuid(wire::get_uuid(buf, "operator")?))
        } else {
            None
        };
        Ok(Self {
            id,
            kind,
            mode,
            broadcasting,
            target_argument,
            unenforcement_operator,
        })
    }
}

/// A punishment was permanently removed from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpungePacket {
    pub id: PunishmentId,
}

impl ExpungePacket {
    fn write_to(&self, buf: &mut impl BufMut) {
        wire::put_i64(buf, self.id);
    }

    fn read_from(buf: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            id: wire::get_i64(buf, "id")?,
        })
    }
}

/// A punishment's reason, scope or end time changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateDetailsPacket {
    pub id: PunishmentId,
}

impl UpdateDetailsPacket {
    fn write_to(&self, buf: &mut impl BufMut) {
        wire::put_i64(buf, self.id);
    }

    fn read_from(buf: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            id: wire::get_i64(buf, "id")?,
        })
    }
}
