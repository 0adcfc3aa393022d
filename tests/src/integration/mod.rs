//! # Integration Tests
//!
//! Every node in these tests lives in one process but has its own protocol
//! instance, so each one sees the others' messages exactly as a separate
//! process would.

pub mod bus_flows;
pub mod mailbox_flows;
pub mod node_flows;
