//! Domain layer: packets, envelope and wire primitives.
//!
//! Pure encoding logic, no I/O.

pub mod envelope;
pub mod packets;
pub mod wire;

pub use envelope::{DecodedEnvelope, Envelope, PROTOCOL_VERSION};
pub use packets::{EnforceUnenforcePacket, ExpungePacket, Packet, UpdateDetailsPacket};
