//! # Bus Flows
//!
//! Processes exchanging notifications over the message bus instead of the
//! mailbox table. The bus echoes every frame to its publisher, so these
//! flows also exercise self-message suppression on a live medium.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ms_01_synchronization::test_utils::{
        make_punishment, EnforcerCall, InMemorySelector, RecordingEnforcer,
    };
    use ms_01_synchronization::{
        BusTransport, MessageReceiver, SynchronizationApi, SynchronizationProtocol,
        SynchronizationService,
    };
    use shared_bus::InMemoryMessageBus;
    use shared_types::{EnforcementMode, EnforcementOptions, PunishmentType};

    struct Process {
        sync: Arc<SynchronizationService>,
        transport: Arc<BusTransport>,
        enforcer: Arc<RecordingEnforcer>,
    }

    fn process(bus: &Arc<InMemoryMessageBus>, selector: &Arc<InMemorySelector>) -> Process {
        let transport = Arc::new(BusTransport::new(bus.clone()));
        let enforcer = Arc::new(RecordingEnforcer::new());
        let receiver = MessageReceiver::new(selector.clone(), enforcer.clone());
        let sync = Arc::new(SynchronizationService::new(
            SynchronizationProtocol::new(),
            transport.clone(),
            receiver,
        ));
        Process {
            sync,
            transport,
            enforcer,
        }
    }

    #[tokio::test]
    async fn test_bus_delivers_to_other_process_only() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let ban = make_punishment(42, PunishmentType::Ban, 0);
        let selector = Arc::new(InMemorySelector::with([ban.clone()]));
        let a = process(&bus, &selector);
        let b = process(&bus, &selector);

        a.sync
            .dispatch_change(
                ban.reference(),
                EnforcementMode::Do,
                &EnforcementOptions::global(),
            )
            .await
            .unwrap();

        assert_eq!(a.sync.poll_once().await, 0);
        assert_eq!(b.sync.poll_once().await, 1);
        assert_eq!(b.sync.poll_once().await, 0);
        assert!(a.enforcer.calls().is_empty());
        assert_eq!(b.enforcer.calls(), vec![EnforcerCall::Enforce(ban)]);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_frames() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let selector = Arc::new(InMemorySelector::new());
        let a = process(&bus, &selector);

        a.sync.dispatch_update_details(1).await.unwrap();
        let b = process(&bus, &selector);
        a.sync.dispatch_update_details(2).await.unwrap();

        assert_eq!(b.sync.poll_once().await, 1);
        assert_eq!(b.enforcer.calls(), vec![EnforcerCall::RefreshDetails(2)]);
    }

    #[tokio::test]
    async fn test_slow_process_loses_oldest_frames() {
        let bus = Arc::new(InMemoryMessageBus::with_capacity(2));
        let selector = Arc::new(InMemorySelector::new());
        let a = process(&bus, &selector);
        let b = process(&bus, &selector);

        for id in 1..=4 {
            a.sync.dispatch_expunge(id).await.unwrap();
        }

        assert_eq!(b.sync.poll_once().await, 2);
        assert_eq!(
            b.enforcer.calls(),
            vec![EnforcerCall::ClearExpunged(3), EnforcerCall::ClearExpunged(4)]
        );
        assert_eq!(b.transport.lagged(), 2);
    }
}
