//! # Node Runtime Library
//!
//! Composition root for a moderation node. Exposes the wiring so integration
//! tests can build several nodes in one process; the `main.rs` binary runs a
//! single node on in-memory backends.
//!
//! ## Modules
//!
//! - `container/` - configuration and subsystem wiring
//! - `adapters/` - cache-aware enforcer and in-memory backends
//! - `enforcement` - facade used by moderation commands
//! - `runtime` - background tasks and graceful shutdown
//! - `logging` - tracing subscriber setup

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod container;
pub mod enforcement;
pub mod logging;
pub mod runtime;

pub use container::{
    load_config, Backends, ConfigError, MuteCacheHandle, NodeConfig, NodeContainer, SyncMedium,
};
pub use enforcement::{EnforcementFacade, FacadeError};
pub use logging::init_tracing;
pub use runtime::NodeRuntime;
