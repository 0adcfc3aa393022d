//! Synchronization protocol
//!
//! Wraps packets in envelopes stamped with this process's instance ID and
//! unwraps received envelopes, discarding those this process sent itself.
//! The instance ID is the only loop-prevention mechanism, so it is a random
//! v4 UUID generated once per process and never derived from shared state.

use bytes::{Buf, Bytes};
use shared_types::{EnforcementMode, EnforcementOptions, PunishmentId, PunishmentRef};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    DecodedEnvelope, EnforceUnenforcePacket, Envelope, ExpungePacket, Packet,
    UpdateDetailsPacket,
};
use crate::error::{DecodeError, EncodeError};

/// Envelope encoding bound to one process instance.
#[derive(Debug, Clone)]
pub struct SynchronizationProtocol {
    instance_id: Uuid,
}

impl SynchronizationProtocol {
    /// Create a protocol with a freshly generated instance ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_instance_id(Uuid::new_v4())
    }

    /// Create a protocol with a fixed instance ID.
    #[must_use]
    pub fn with_instance_id(instance_id: Uuid) -> Self {
        Self { instance_id }
    }

    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Encode an enforcement or un-enforcement.
    pub fn serialize(
        &self,
        reference: PunishmentRef,
        mode: EnforcementMode,
        options: &EnforcementOptions,
    ) -> Result<Bytes, EncodeError> {
        let packet = EnforceUnenforcePacket::new(reference, mode, options);
        self.serialize_packet(Packet::EnforceOrUnenforce(packet))
    }

    /// Encode an expunge notification.
    pub fn serialize_expunge(&self, id: PunishmentId) -> Result<Bytes, EncodeError> {
        self.serialize_packet(Packet::Expunge(ExpungePacket { id }))
    }

    /// Encode a details-changed notification.
    pub fn serialize_update_details(&self, id: PunishmentId) -> Result<Bytes, EncodeError> {
        self.serialize_packet(Packet::UpdateDetails(UpdateDetailsPacket { id }))
    }

    /// Wrap any packet with the current version and this instance's ID.
    pub fn serialize_packet(&self, packet: Packet) -> Result<Bytes, EncodeError> {
        Envelope::new(self.instance_id, packet).encode()
    }

    /// Unwrap a received envelope.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(packet))` - a packet from another process
    /// - `Ok(None)` - an unknown protocol version, or a message this process sent
    /// - `Err` - malformed bytes
    pub fn deserialize(&self, bytes: impl Buf) -> Result<Option<Packet>, DecodeError> {
        match Envelope::decode(bytes)? {
            DecodedEnvelope::UnsupportedVersion(version) => {
                debug!(version, "Skipping envelope with unsupported protocol version");
                Ok(None)
            }
            DecodedEnvelope::Supported(envelope) if envelope.origin == self.instance_id => {
                Ok(None)
            }
            DecodedEnvelope::Supported(envelope) => Ok(Some(envelope.packet)),
        }
    }
}

impl Default for SynchronizationProtocol {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PROTOCOL_VERSION;
    use shared_types::{BroadcastingPolicy, Operator, PunishmentType};

    fn reference(id: i64) -> PunishmentRef {
        PunishmentRef {
            id,
            kind: PunishmentType::Mute,
        }
    }

    #[test]
    fn test_instance_ids_are_unique() {
        let a = SynchronizationProtocol::new();
        let b = SynchronizationProtocol::new();
        assert_ne!(a.instance_id(), b.instance_id());
        assert!(!a.instance_id().is_nil());
    }

    #[test]
    fn test_other_instance_receives_packet() {
        let sender = SynchronizationProtocol::new();
        let receiver = SynchronizationProtocol::new();
        let options = EnforcementOptions::global()
            .with_broadcasting(BroadcastingPolicy::Silent)
            .with_target_argument("Steve")
            .with_unenforcement_operator(Operator::Player(Uuid::new_v4()));

        let bytes = sender
            .serialize(reference(42), EnforcementMode::Undo, &options)
            .unwrap();
        let packet = receiver.deserialize(bytes).unwrap().expect("packet");

        let Packet::EnforceOrUnenforce(p) = packet else {
            panic!("wrong packet kind: {packet:?}");
        };
        assert_eq!(p.reference(), reference(42));
        assert_eq!(p.mode, EnforcementMode::Undo);
        assert_eq!(p.broadcasting, BroadcastingPolicy::Silent);
        assert_eq!(p.target_argument.as_deref(), Some("Steve"));
        assert_eq!(p.unenforcement_operator, options.unenforcement_operator);
    }

    #[test]
    fn test_own_messages_are_discarded() {
        let protocol = SynchronizationProtocol::new();
        let messages = [
            protocol
                .serialize(reference(1), EnforcementMode::Do, &EnforcementOptions::global())
                .unwrap(),
            protocol.serialize_expunge(2).unwrap(),
            protocol.serialize_update_details(3).unwrap(),
        ];
        for bytes in messages {
            assert_eq!(protocol.deserialize(bytes).unwrap(), None);
        }
    }

    #[test]
    fn test_unknown_version_yields_no_packet() {
        let sender = SynchronizationProtocol::new();
        let receiver = SynchronizationProtocol::new();
        let mut raw = sender.serialize_expunge(5).unwrap().to_vec();
        raw[0] = PROTOCOL_VERSION + 1;
        assert_eq!(receiver.deserialize(Bytes::from(raw)).unwrap(), None);
    }

    #[test]
    fn test_malformed_bytes_are_an_error() {
        let receiver = SynchronizationProtocol::new();
        let mut raw = SynchronizationProtocol::new()
            .serialize_update_details(5)
            .unwrap()
            .to_vec();
        raw.truncate(20);
        assert!(receiver.deserialize(Bytes::from(raw)).is_err());
    }
}
