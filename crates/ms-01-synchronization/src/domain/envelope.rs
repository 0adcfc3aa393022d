//! Synchronization envelope
//!
//! `[1B version][16B origin instance][packet]`. The version byte is read
//! first so that a process can skip messages written by a newer protocol
//! without attempting to parse them.

use bytes::{Buf, Bytes, BytesMut};
use uuid::Uuid;

use super::packets::Packet;
use super::wire;
use crate::error::{DecodeError, EncodeError};

/// Current protocol version written by this build.
pub const PROTOCOL_VERSION: u8 = 1;

/// Outcome of reading an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEnvelope {
    /// The envelope uses a version this build understands.
    Supported(Envelope),
    /// The envelope uses an unknown version; its body was not parsed.
    UnsupportedVersion(u8),
}

/// A packet plus its protocol version and originating process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: u8,
    pub origin: Uuid,
    pub packet: Packet,
}

impl Envelope {
    /// Wrap a packet with the current protocol version.
    #[must_use]
    pub fn new(origin: Uuid, packet: Packet) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            origin,
            packet,
        }
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::with_capacity(64);
        wire::put_u8(&mut buf, self.version);
        wire::put_uuid(&mut buf, self.origin);
        self.packet.write_to(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode from bytes.
    pub fn decode(mut bytes: impl Buf) -> Result<DecodedEnvelope, DecodeError> {
        let version = wire::get_u8(&mut bytes, "version")?;
        if version != PROTOCOL_VERSION {
            return Ok(DecodedEnvelope::UnsupportedVersion(version));
        }
        let origin = wire::get_uuid(&mut bytes, "origin")?;
        let packet = Packet::read_from(&mut bytes)?;
        Ok(DecodedEnvelope::Supported(Envelope {
            version,
            origin,
            packet,
        }))
    }
}
