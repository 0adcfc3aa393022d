//! # Node Runtime
//!
//! Owns the node's background tasks:
//!
//! - the synchronization poll loop
//! - the mute cache housekeeping task (offline purge or expiry sweep)
//!
//! Every task watches one shutdown channel. `shutdown()` flips it and joins
//! the tasks.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{MuteCacheHandle, NodeContainer};

/// A running node.
pub struct NodeRuntime {
    container: Arc<NodeContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    pub fn new(container: NodeContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the background tasks. Calling this twice is a no-op.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            warn!("Node runtime already started");
            return;
        }

        let config = &self.container.config;
        let sync = Arc::clone(&self.container.sync);
        tasks.push(tokio::spawn(
            sync.run(config.sync.poll_interval(), self.shutdown_rx.clone()),
        ));

        let interval = config.mute_cache.purge_interval();
        let housekeeping = match &self.container.mute_cache {
            MuteCacheHandle::AlwaysAvailable(cache) => {
                Arc::clone(cache).spawn_purge_task(interval, self.shutdown_rx.clone())
            }
            MuteCacheHandle::OnDemand(cache) => {
                Arc::clone(cache).spawn_eviction_task(interval, self.shutdown_rx.clone())
            }
        };
        tasks.push(housekeeping);

        info!(tasks = tasks.len(), "Node runtime started");
    }

    /// Signal every task to stop and wait for them.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            warn!("No task was listening for shutdown");
        }

        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Background task ended abnormally");
            }
        }
        info!("Shutdown complete");
    }

    pub fn container(&self) -> Arc<NodeContainer> {
        Arc::clone(&self.container)
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }
}
