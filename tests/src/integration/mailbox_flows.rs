//! # Mailbox Flows
//!
//! Two or more processes sharing one mailbox table and one wall clock.
//!
//! ## Flows Tested
//!
//! 1. An enforcement committed on A is applied once on B, never on A
//! 2. A silent un-enforcement is applied without a store fetch
//! 3. A received message is never dispatched again
//! 4. A failed poll gives up its window

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;

    use ms_01_synchronization::test_utils::{
        make_punishment, EnforcerCall, FlakyMailbox, InMemorySelector, RecordingEnforcer,
    };
    use ms_01_synchronization::{
        DispatchOutcome, InMemoryMailbox, MailboxStore, MailboxTransport, MessageReceiver,
        SyncError, SyncTransport, SynchronizationApi, SynchronizationProtocol,
        SynchronizationService,
    };
    use shared_types::{
        BroadcastingPolicy, EnforcementMode, EnforcementOptions, MockTimeSource, PunishmentRef,
        PunishmentType, StoreError,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Process {
        sync: Arc<SynchronizationService>,
        enforcer: Arc<RecordingEnforcer>,
    }

    fn process(
        transport: Arc<dyn SyncTransport>,
        selector: &Arc<InMemorySelector>,
    ) -> Process {
        let enforcer = Arc::new(RecordingEnforcer::new());
        let receiver = MessageReceiver::new(selector.clone(), enforcer.clone());
        let sync = Arc::new(SynchronizationService::new(
            SynchronizationProtocol::new(),
            transport,
            receiver,
        ));
        Process { sync, enforcer }
    }

    fn mailbox_process(
        store: Arc<dyn MailboxStore>,
        clock: &Arc<MockTimeSource>,
        selector: &Arc<InMemorySelector>,
    ) -> Process {
        process(Arc::new(MailboxTransport::new(store, clock.clone())), selector)
    }

    /// Polls a real mailbox but refuses to send, counting attempts.
    struct ReceiveOnlyTransport {
        inner: MailboxTransport,
        dispatch_attempts: AtomicUsize,
    }

    #[async_trait]
    impl SyncTransport for ReceiveOnlyTransport {
        async fn dispatch(&self, _message: Bytes) -> Result<(), SyncError> {
            self.dispatch_attempts.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("receive-only transport".to_string()).into())
        }

        async fn poll(&self) -> Result<Vec<Bytes>, SyncError> {
            self.inner.poll().await
        }
    }

    fn global() -> EnforcementOptions {
        EnforcementOptions::global()
    }

    // =========================================================================
    // INTEGRATION TESTS
    // =========================================================================

    #[tokio::test]
    async fn test_enforcement_applied_once_on_other_process() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let clock = Arc::new(MockTimeSource::new(1_700_000_000_000));
        let ban = make_punishment(42, PunishmentType::Ban, 0);
        let selector = Arc::new(InMemorySelector::with([ban.clone()]));
        let a = mailbox_process(mailbox.clone(), &clock, &selector);
        let b = mailbox_process(mailbox.clone(), &clock, &selector);
        a.sync.poll_once().await;
        b.sync.poll_once().await;

        clock.advance(5);
        let outcome = a
            .sync
            .dispatch_change(ban.reference(), EnforcementMode::Do, &global())
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Dispatched);
        clock.advance(5);

        assert_eq!(a.sync.poll_once().await, 0);
        assert_eq!(b.sync.poll_once().await, 1);
        clock.advance(5);
        assert_eq!(b.sync.poll_once().await, 0);

        assert_eq!(b.enforcer.calls(), vec![EnforcerCall::Enforce(ban)]);
        assert_eq!(
            b.enforcer.last_options().map(|o| o.broadcasting),
            Some(BroadcastingPolicy::Normal)
        );
        assert!(a.enforcer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_every_other_process_receives() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let clock = Arc::new(MockTimeSource::new(1_700_000_000_000));
        let mute = make_punishment(3, PunishmentType::Mute, 0);
        let selector = Arc::new(InMemorySelector::with([mute.clone()]));
        let processes: Vec<Process> = (0..4)
            .map(|_| mailbox_process(mailbox.clone(), &clock, &selector))
            .collect();
        for p in &processes {
            p.sync.poll_once().await;
        }

        clock.advance(1);
        processes[0]
            .sync
            .dispatch_change(mute.reference(), EnforcementMode::Do, &global())
            .await
            .unwrap();
        clock.advance(1);

        for p in &processes {
            p.sync.poll_once().await;
        }
        assert!(processes[0].enforcer.calls().is_empty());
        for p in &processes[1..] {
            assert_eq!(p.enforcer.calls(), vec![EnforcerCall::Enforce(mute.clone())]);
        }
    }

    #[tokio::test]
    async fn test_silent_undo_needs_no_fetch() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let clock = Arc::new(MockTimeSource::new(1_700_000_000_000));
        let selector = Arc::new(InMemorySelector::new());
        let a = mailbox_process(mailbox.clone(), &clock, &selector);
        let b = mailbox_process(mailbox.clone(), &clock, &selector);
        b.sync.poll_once().await;

        let reference = PunishmentRef {
            id: 7,
            kind: PunishmentType::Mute,
        };
        clock.advance(1);
        a.sync
            .dispatch_change(
                reference,
                EnforcementMode::Undo,
                &global().with_broadcasting(BroadcastingPolicy::None),
            )
            .await
            .unwrap();
        clock.advance(1);

        assert_eq!(b.sync.poll_once().await, 1);
        assert_eq!(b.enforcer.calls(), vec![EnforcerCall::UnenforceById(reference)]);
        assert_eq!(selector.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_received_message_is_not_dispatched_again() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let clock = Arc::new(MockTimeSource::new(1_700_000_000_000));
        let mute = make_punishment(11, PunishmentType::Mute, 0);
        let selector = Arc::new(InMemorySelector::with([mute.clone()]));
        let a = mailbox_process(mailbox.clone(), &clock, &selector);

        let receive_only = Arc::new(ReceiveOnlyTransport {
            inner: MailboxTransport::new(mailbox.clone(), clock.clone()),
            dispatch_attempts: AtomicUsize::new(0),
        });
        let b = process(receive_only.clone(), &selector);
        b.sync.poll_once().await;

        for mode in [EnforcementMode::Do, EnforcementMode::Undo] {
            clock.advance(1);
            a.sync
                .dispatch_change(mute.reference(), mode, &global())
                .await
                .unwrap();
        }
        a.sync.dispatch_expunge(11).await.unwrap();
        clock.advance(1);

        assert_eq!(b.sync.poll_once().await, 3);
        assert_eq!(receive_only.dispatch_attempts.load(Ordering::SeqCst), 0);
        assert_eq!(mailbox.len(), 3);
        assert_eq!(
            b.enforcer.calls(),
            vec![
                EnforcerCall::Enforce(mute.clone()),
                EnforcerCall::Unenforce(mute),
                EnforcerCall::ClearExpunged(11),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_poll_gives_up_its_window() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let clock = Arc::new(MockTimeSource::new(1_700_000_000_000));
        let mute = make_punishment(12, PunishmentType::Mute, 0);
        let selector = Arc::new(InMemorySelector::with([mute.clone()]));
        let a = mailbox_process(mailbox.clone(), &clock, &selector);
        let flaky = Arc::new(FlakyMailbox::new(mailbox.clone()));
        let b = mailbox_process(flaky.clone(), &clock, &selector);
        b.sync.poll_once().await;

        clock.advance(1);
        a.sync
            .dispatch_change(mute.reference(), EnforcementMode::Do, &global())
            .await
            .unwrap();
        clock.advance(1);
        flaky.set_failing(true);
        assert_eq!(b.sync.poll_once().await, 0);
        assert_eq!(b.sync.stats().poll_failures, 1);

        flaky.set_failing(false);
        clock.advance(1);
        a.sync
            .dispatch_change(mute.reference(), EnforcementMode::Undo, &global())
            .await
            .unwrap();
        clock.advance(1);

        assert_eq!(b.sync.poll_once().await, 1);
        assert_eq!(b.enforcer.calls(), vec![EnforcerCall::Unenforce(mute)]);
    }
}
