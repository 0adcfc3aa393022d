//! # Node Container
//!
//! Builds every subsystem of one node from its configuration and the
//! backends supplied by the deployment, with dependency injection through
//! the subsystems' ports.
//!
//! ## Wiring
//!
//! ```text
//! platform ──→ CacheAwareEnforcer ←── mute cache ←── MuteQuery
//!                  ↑        ↑
//!   MessageReceiver        EnforcementFacade
//!          ↑                      │
//!   SynchronizationService ←──────┘
//!          │
//!   SyncTransport (mailbox rows or bus frames)
//! ```
//!
//! The receiver reaches the platform only through the cache-aware enforcer,
//! never through the service, so a received change is not dispatched again.

pub mod config;

use std::sync::Arc;

use ms_01_synchronization::{
    BusTransport, LocalEnforcer, MailboxStore, MailboxTransport, MessageReceiver,
    PunishmentSelector, SyncTransport, SynchronizationProtocol, SynchronizationService,
    TransportKind,
};
use ms_02_mute_cache::{
    AlwaysAvailableMuteCache, CacheVariant, MuteCache, MuteChecker, MuteMessageFormatter,
    MuteQuery, OnDemandMuteCache, OnlineRoster,
};
use shared_bus::InMemoryMessageBus;
use shared_types::{MonotonicTimeSource, TimeSource};
use tracing::{info, warn};

use crate::adapters::CacheAwareEnforcer;
use crate::enforcement::EnforcementFacade;

pub use config::{load_config, ConfigError, NodeConfig};

/// The shared medium synchronization messages travel through.
#[derive(Clone)]
pub enum SyncMedium {
    /// Rows in the shared store.
    Mailbox(Arc<dyn MailboxStore>),
    /// The message bus.
    Bus(Arc<InMemoryMessageBus>),
}

impl SyncMedium {
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Mailbox(_) => TransportKind::Mailbox,
            Self::Bus(_) => TransportKind::Bus,
        }
    }
}

/// Everything a node needs from the store and the platform.
#[derive(Clone)]
pub struct Backends {
    pub medium: SyncMedium,
    /// Wall clock, for mailbox rows and punishment end-times.
    pub wall_clock: Arc<dyn TimeSource>,
    pub selector: Arc<dyn PunishmentSelector>,
    pub mute_query: Arc<dyn MuteQuery>,
    pub roster: Arc<dyn OnlineRoster>,
    pub platform: Arc<dyn LocalEnforcer>,
    pub formatter: Arc<dyn MuteMessageFormatter>,
}

/// The configured mute cache, with its concrete type kept for housekeeping.
#[derive(Clone)]
pub enum MuteCacheHandle {
    AlwaysAvailable(Arc<AlwaysAvailableMuteCache>),
    OnDemand(Arc<OnDemandMuteCache>),
}

impl MuteCacheHandle {
    pub fn as_cache(&self) -> Arc<dyn MuteCache> {
        match self {
            Self::AlwaysAvailable(cache) => Arc::clone(cache) as Arc<dyn MuteCache>,
            Self::OnDemand(cache) => Arc::clone(cache) as Arc<dyn MuteCache>,
        }
    }
}

/// All subsystem instances of one node.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub sync: Arc<SynchronizationService>,
    pub mute_cache: MuteCacheHandle,
    pub checker: MuteChecker,
    pub enforcer: Arc<CacheAwareEnforcer>,
    pub enforcement: EnforcementFacade,
}

impl NodeContainer {
    /// Wire a node.
    ///
    /// The transport follows `backends.medium`; a different
    /// `config.sync.transport` is reported and ignored.
    pub fn new(config: NodeConfig, backends: Backends) -> Self {
        if backends.medium.kind() != config.sync.transport {
            warn!(
                configured = ?config.sync.transport,
                supplied = ?backends.medium.kind(),
                "Configured transport differs from the supplied medium"
            );
        }

        let transport: Arc<dyn SyncTransport> = match &backends.medium {
            SyncMedium::Mailbox(store) => Arc::new(MailboxTransport::new(
                Arc::clone(store),
                Arc::clone(&backends.wall_clock),
            )),
            SyncMedium::Bus(bus) => Arc::new(BusTransport::new(Arc::clone(bus))),
        };

        let mute_cache = match config.mute_cache.variant {
            CacheVariant::AlwaysAvailable => {
                MuteCacheHandle::AlwaysAvailable(Arc::new(AlwaysAvailableMuteCache::with_clocks(
                    Arc::clone(&backends.mute_query),
                    Arc::clone(&backends.roster),
                    &config.mute_cache,
                    Arc::new(MonotonicTimeSource::new()),
                    Arc::clone(&backends.wall_clock),
                )))
            }
            CacheVariant::OnDemand => MuteCacheHandle::OnDemand(Arc::new(
                OnDemandMuteCache::with_clocks(
                    Arc::clone(&backends.mute_query),
                    &config.mute_cache,
                    Arc::new(MonotonicTimeSource::new()),
                    Arc::clone(&backends.wall_clock),
                ),
            )),
        };
        let cache = mute_cache.as_cache();

        let enforcer = Arc::new(CacheAwareEnforcer::new(
            Arc::clone(&backends.platform),
            Arc::clone(&cache),
            Arc::clone(&backends.selector),
        ));
        let receiver = MessageReceiver::new(Arc::clone(&backends.selector), enforcer.clone());

        let protocol = SynchronizationProtocol::new();
        info!(
            instance_id = %protocol.instance_id(),
            transport = ?backends.medium.kind(),
            mute_cache = ?config.mute_cache.variant,
            "Node wired"
        );
        let sync = Arc::new(SynchronizationService::new(protocol, transport, receiver));

        let checker = MuteChecker::new(cache, Arc::clone(&backends.formatter));
        let enforcement = EnforcementFacade::new(enforcer.clone(), sync.clone());

        Self {
            config,
            sync,
            mute_cache,
            checker,
            enforcer,
            enforcement,
        }
    }

    pub fn cache(&self) -> Arc<dyn MuteCache> {
        self.mute_cache.as_cache()
    }
}
