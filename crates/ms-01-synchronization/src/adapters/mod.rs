//! Adapters Layer
//!
//! Concrete transports over the shared mailbox table and the message bus.

pub mod bus_transport;
pub mod mailbox;

pub use bus_transport::BusTransport;
pub use mailbox::{InMemoryMailbox, MailboxTransport};
