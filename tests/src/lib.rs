//! # Moderation Sync Test Suite
//!
//! Unified test crate for flows that span several nodes or subsystems.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Codec and cache benchmarks (criterion)
//! └── src/integration/
//!     ├── mailbox_flows.rs  # Two processes sharing a mailbox
//!     ├── bus_flows.rs      # Two processes sharing the message bus
//!     └── node_flows.rs     # Fully wired nodes: facade, cache, runtime
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p modsync-tests
//! cargo test -p modsync-tests integration::node_flows
//! cargo bench -p modsync-tests
//! ```

#![allow(dead_code)]

pub mod integration;
