//! # Node Flows
//!
//! Fully wired nodes sharing one punishment store and one mailbox. Changes
//! enter through the enforcement facade on one node and must show up in the
//! mute cache and chat checks of the other.

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use std::time::Duration;

    use ms_01_synchronization::test_utils::{EnforcerCall, RecordingEnforcer};
    use ms_01_synchronization::{DispatchOutcome, InMemoryMailbox, SyncConfig, SynchronizationApi};
    use ms_02_mute_cache::{CacheVariant, MuteCache, MuteCacheConfig, MuteCacheKey};
    use node_runtime::adapters::{ConnectedUsers, InMemoryPunishmentStore, PlainDenialFormatter};
    use node_runtime::{Backends, NodeConfig, NodeContainer, NodeRuntime, SyncMedium};
    use shared_bus::InMemoryMessageBus;
    use shared_types::{
        EnforcementOptions, MockTimeSource, Operator, Punishment, PunishmentId, PunishmentType,
        ServerScope, Victim,
    };
    use uuid::Uuid;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Cluster {
        store: Arc<InMemoryPunishmentStore>,
        medium: SyncMedium,
        clock: Arc<MockTimeSource>,
    }

    struct Node {
        container: NodeContainer,
        platform: Arc<RecordingEnforcer>,
        users: Arc<ConnectedUsers>,
    }

    impl Cluster {
        fn new(medium: SyncMedium) -> Self {
            let clock = Arc::new(MockTimeSource::new(1_700_000_000_000));
            let store = Arc::new(InMemoryPunishmentStore::with_clock(clock.clone()));
            Self {
                store,
                medium,
                clock,
            }
        }

        fn mailbox() -> Self {
            Self::new(SyncMedium::Mailbox(Arc::new(InMemoryMailbox::new())))
        }

        fn node(&self, variant: CacheVariant) -> Node {
            let platform = Arc::new(RecordingEnforcer::new());
            let users = Arc::new(ConnectedUsers::new());
            let backends = Backends {
                medium: self.medium.clone(),
                wall_clock: self.clock.clone(),
                selector: self.store.clone(),
                mute_query: self.store.clone(),
                roster: users.clone(),
                platform: platform.clone(),
                formatter: Arc::new(PlainDenialFormatter),
            };
            let config = NodeConfig {
                sync: SyncConfig::default().with_transport(self.medium.kind()),
                mute_cache: MuteCacheConfig::default().with_variant(variant),
            };
            Node {
                container: NodeContainer::new(config, backends),
                platform,
                users,
            }
        }

        /// Move the shared wall clock so the next mailbox row gets a new stamp.
        fn tick(&self) {
            self.clock.advance(10);
        }
    }

    fn key() -> MuteCacheKey {
        MuteCacheKey::new(Uuid::new_v4(), IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)))
    }

    fn mute_for(id: PunishmentId, key: &MuteCacheKey) -> Punishment {
        Punishment {
            id,
            kind: PunishmentType::Mute,
            victim: Victim::Player(key.user),
            operator: Operator::Console,
            reason: "spam".to_string(),
            scope: ServerScope::Global,
            start: 1_700_000_000,
            end: 0,
        }
    }

    // =========================================================================
    // INTEGRATION TESTS
    // =========================================================================

    #[tokio::test]
    async fn test_mute_enacted_elsewhere_reaches_always_available_cache() {
        let cluster = Cluster::mailbox();
        let a = cluster.node(CacheVariant::AlwaysAvailable);
        let b = cluster.node(CacheVariant::AlwaysAvailable);
        a.container.sync.poll_once().await;
        b.container.sync.poll_once().await;

        let key = key();
        b.users.connect(key.user);
        let login = b.container.cache().on_login(key).unwrap();
        assert_eq!(login.await, None);
        assert_eq!(b.container.checker.check_mute(key).await, None);

        let mute = mute_for(42, &key);
        cluster.store.insert(mute.clone());
        cluster.tick();
        let outcome = a
            .container
            .enforcement
            .enact(&mute, &EnforcementOptions::global())
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Dispatched);
        cluster.tick();

        assert_eq!(b.container.sync.poll_once().await, 1);
        assert_eq!(b.platform.calls(), vec![EnforcerCall::Enforce(mute.clone())]);
        assert_eq!(a.platform.calls(), vec![EnforcerCall::Enforce(mute.clone())]);
        let denial = b.container.checker.check_mute(key).await.unwrap();
        assert_eq!(denial.as_str(), "You are permanently muted: spam");

        cluster.tick();
        a.container
            .enforcement
            .revoke(&mute, &EnforcementOptions::global())
            .await
            .unwrap();
        cluster.tick();

        assert_eq!(b.container.sync.poll_once().await, 1);
        assert_eq!(b.container.checker.check_mute(key).await, None);
    }

    #[tokio::test]
    async fn test_expunge_clears_on_demand_cache() {
        let cluster = Cluster::mailbox();
        let a = cluster.node(CacheVariant::OnDemand);
        let b = cluster.node(CacheVariant::OnDemand);
        b.container.sync.poll_once().await;

        let key = key();
        let mute = mute_for(8, &key);
        cluster.store.insert(mute.clone());
        assert_eq!(b.container.cache().get_cached_mute(key).await, Some(mute));

        cluster.store.remove(8);
        cluster.tick();
        a.container.enforcement.expunge(8).await.unwrap();
        cluster.tick();

        assert_eq!(b.container.sync.poll_once().await, 1);
        assert_eq!(b.container.cache().get_cached_mute(key).await, None);
        assert_eq!(b.platform.calls(), vec![EnforcerCall::ClearExpunged(8)]);
    }

    #[tokio::test]
    async fn test_edited_mute_refreshes_cached_copy() {
        let cluster = Cluster::mailbox();
        let a = cluster.node(CacheVariant::OnDemand);
        let b = cluster.node(CacheVariant::OnDemand);
        b.container.sync.poll_once().await;

        let key = key();
        let mute = mute_for(9, &key);
        cluster.store.insert(mute.clone());
        b.container.cache().get_cached_mute(key).await;

        let mut edited = mute;
        edited.reason = "advertising".to_string();
        cluster.store.insert(edited.clone());
        cluster.tick();
        a.container.enforcement.update_details(9).await.unwrap();
        cluster.tick();

        b.container.sync.poll_once().await;
        let denial = b.container.checker.check_mute(key).await.unwrap();
        assert_eq!(denial.as_str(), "You are permanently muted: advertising");
    }

    #[tokio::test]
    async fn test_nodes_over_bus() {
        let cluster = Cluster::new(SyncMedium::Bus(Arc::new(InMemoryMessageBus::new())));
        let a = cluster.node(CacheVariant::OnDemand);
        let b = cluster.node(CacheVariant::OnDemand);

        let key = key();
        assert_eq!(b.container.cache().get_cached_mute(key).await, None);

        let mute = mute_for(5, &key);
        cluster.store.insert(mute.clone());
        a.container
            .enforcement
            .enact(&mute, &EnforcementOptions::global())
            .await
            .unwrap();

        assert_eq!(b.container.sync.poll_once().await, 1);
        assert_eq!(b.container.cache().get_cached_mute(key).await, Some(mute));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_applies_changes_in_background() {
        let cluster = Cluster::mailbox();
        let a = cluster.node(CacheVariant::AlwaysAvailable);
        let b = cluster.node(CacheVariant::AlwaysAvailable);
        let b_platform = b.platform.clone();
        let a = NodeRuntime::new(a.container);
        let b = NodeRuntime::new(b.container);
        a.start();
        b.start();

        // The first poll of each loop sets its baseline.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let victim = key();
        let mute = mute_for(77, &victim);
        cluster.store.insert(mute.clone());
        cluster.tick();
        a.container()
            .enforcement
            .enact(&mute, &EnforcementOptions::global())
            .await
            .unwrap();
        cluster.tick();

        let interval = NodeConfig::default().sync.poll_interval();
        tokio::time::sleep(interval + Duration::from_millis(10)).await;

        a.shutdown().await;
        b.shutdown().await;
        assert_eq!(b_platform.calls(), vec![EnforcerCall::Enforce(mute)]);
        assert_eq!(b.container().sync.stats().applied, 1);
    }
}
