//! # Moderation Node
//!
//! Runs one node on in-memory backends.
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber
//! 2. Load configuration (file, then `MODSYNC_*` environment overrides)
//! 3. Build backends and wire the subsystems
//! 4. Start the poll loop and cache housekeeping
//! 5. Wait for Ctrl+C, then shut down gracefully

use std::sync::Arc;

use anyhow::Result;
use ms_01_synchronization::{InMemoryMailbox, TransportKind};
use node_runtime::adapters::{
    ConnectedUsers, InMemoryPunishmentStore, LoggingPlatform, PlainDenialFormatter,
};
use node_runtime::{init_tracing, load_config, Backends, NodeContainer, NodeRuntime, SyncMedium};
use shared_bus::InMemoryMessageBus;
use shared_types::SystemTimeSource;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let config = load_config()?;
    info!(
        poll_interval_ms = config.sync.poll_interval_ms,
        transport = ?config.sync.transport,
        mute_cache = ?config.mute_cache.variant,
        "Configuration loaded"
    );

    let medium = match config.sync.transport {
        TransportKind::Mailbox => SyncMedium::Mailbox(Arc::new(InMemoryMailbox::new())),
        TransportKind::Bus => SyncMedium::Bus(Arc::new(InMemoryMessageBus::new())),
    };
    let store = Arc::new(InMemoryPunishmentStore::new());
    let backends = Backends {
        medium,
        wall_clock: Arc::new(SystemTimeSource),
        selector: store.clone(),
        mute_query: store,
        roster: Arc::new(ConnectedUsers::new()),
        platform: Arc::new(LoggingPlatform::new("local")),
        formatter: Arc::new(PlainDenialFormatter),
    };

    let runtime = NodeRuntime::new(NodeContainer::new(config, backends));
    runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
