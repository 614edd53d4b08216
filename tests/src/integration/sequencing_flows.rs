//! # Sequencing Integration Flows
//!
//! Sequence assignment, the conversation log and traffic accounting
//! exercised across crate boundaries.
//!
//! ## Flows Tested
//!
//! 1. **Concurrency**: many callers on one stream get distinct, increasing
//!    numbers from both assigners; nodes sharing a block source number in
//!    arrival order
//! 2. **Conversation log**: group chat through the pipeline lands in the
//!    store in sequence order; a rejected message leaves a gap
//! 3. **Traffic**: counting wrappers feed one counter that drains per sample

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::{Read, Write};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use shared_types::{
        Address, DeliveryError, Direction, InterceptResult, Phase, SessionInfo, Stanza,
        StanzaInterceptor, StreamKey,
    };
    use xs_01_traffic_accounting::{CountingReader, CountingWriter, TrafficCounter};
    use xs_03_sequencing::{
        BlockSequenceAssigner, ConversationLogger, GroupChatStreamResolver, InMemoryBlockSource,
        InMemoryConversationStore, LocalSequenceAssigner, SequenceAssigner, SequencingInterceptor,
    };
    use xs_04_interceptors::{
        DispatchOutcome, InterceptorRegistry, PipelineDispatcher, StanzaPipeline, StanzaRouter,
        StanzaTransport,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    struct Sink;

    impl StanzaRouter for Sink {
        fn route(&self, _: &Stanza, _: &SessionInfo) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    impl StanzaTransport for Sink {
        fn send(&self, _: &Stanza, _: &SessionInfo) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    /// Rejects messages whose body is "spam".
    struct SpamFilter;

    impl StanzaInterceptor for SpamFilter {
        fn intercept(
            &self,
            stanza: &mut Stanza,
            _: &SessionInfo,
            _: Direction,
            phase: Phase,
        ) -> InterceptResult {
            if phase == Phase::Pre && stanza.body() == Some("spam") {
                return InterceptResult::reject("spam");
            }
            InterceptResult::Accepted
        }
    }

    fn room_message(body: &str) -> Stanza {
        Stanza::message()
            .with_type("groupchat")
            .with_from(addr("romeo@example.com/orchard"))
            .with_to(addr("lobby@conference.example.com"))
            .with_body(body)
    }

    fn assert_distinct_and_increasing(per_caller: Vec<Vec<u64>>, total: usize) {
        let mut seen = HashSet::new();
        for values in &per_caller {
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            for v in values {
                assert!(seen.insert(*v), "duplicate sequence {v}");
            }
        }
        assert_eq!(seen.len(), total);
    }

    // =============================================================================
    // CONCURRENT ASSIGNMENT
    // =============================================================================

    fn hammer(assigner: Arc<dyn SequenceAssigner>, callers: usize, per_caller: usize) -> Vec<Vec<u64>> {
        let stream = StreamKey::new("lobby@conference.example.com");
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let assigner = assigner.clone();
                let stream = stream.clone();
                thread::spawn(move || {
                    (0..per_caller)
                        .map(|_| assigner.next_sequence(&stream).unwrap().value())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn test_local_assigner_concurrent_callers() {
        let results = hammer(Arc::new(LocalSequenceAssigner::new()), 8, 500);
        assert_distinct_and_increasing(results, 4_000);
    }

    #[test]
    fn test_block_assigner_concurrent_callers() {
        let assigner =
            BlockSequenceAssigner::new(Arc::new(InMemoryBlockSource::new()), 1, 64).unwrap();
        let results = hammer(Arc::new(assigner), 8, 500);
        assert_distinct_and_increasing(results, 4_000);
    }

    #[test]
    fn test_two_nodes_share_block_source_without_collisions() {
        let source = Arc::new(InMemoryBlockSource::new());
        let a = BlockSequenceAssigner::new(source.clone(), 1, 10).unwrap();
        let b = BlockSequenceAssigner::new(source, 2, 10).unwrap();
        let stream = StreamKey::new("lobby@conference.example.com");

        let mut seen = HashSet::new();
        for _ in 0..35 {
            assert!(seen.insert(a.next_sequence(&stream).unwrap().value()));
            assert!(seen.insert(b.next_sequence(&stream).unwrap().value()));
        }
    }

    #[test]
    fn test_two_nodes_number_in_arrival_order() {
        let source = Arc::new(InMemoryBlockSource::new());
        let a = BlockSequenceAssigner::new(source.clone(), 1, 10).unwrap();
        let b = BlockSequenceAssigner::new(source, 2, 10).unwrap();
        let stream = StreamKey::new("lobby@conference.example.com");

        // Bursts of uneven length on each node, as a busy room would see.
        let arrivals = [&a, &a, &b, &a, &b, &b, &b, &a, &a, &a, &b, &a];
        let numbers: Vec<u64> = arrivals
            .iter()
            .map(|node| node.next_sequence(&stream).unwrap().value())
            .collect();

        assert!(
            numbers.windows(2).all(|w| w[0] < w[1]),
            "numbers out of arrival order: {numbers:?}"
        );
        assert!(a.stale_blocks() + b.stale_blocks() > 0);
    }

    // =============================================================================
    // CONVERSATION LOG
    // =============================================================================

    #[tokio::test]
    async fn test_group_chat_logged_in_order_with_gap_for_rejection() {
        let store = Arc::new(InMemoryConversationStore::new());
        let logger = Arc::new(
            ConversationLogger::start(store.clone(), 2, Duration::from_millis(10)).unwrap(),
        );
        let sequencing = Arc::new(
            SequencingInterceptor::new(
                Arc::new(LocalSequenceAssigner::new()),
                Arc::new(GroupChatStreamResolver::new("conference.example.com")),
            )
            .with_logger(logger.clone()),
        );

        let registry = Arc::new(InterceptorRegistry::new());
        let dispatcher = PipelineDispatcher::new(registry.clone(), Arc::new(Sink), Arc::new(Sink))
            .with_builtin(sequencing.clone());
        // Runs after sequencing so the spam message consumes a number.
        let dispatcher = dispatcher.with_builtin(Arc::new(SpamFilter));

        let session = SessionInfo::new(addr("romeo@example.com/orchard"), addr("example.com"));
        for body in ["one", "spam", "two", "three"] {
            let mut message = room_message(body);
            let outcome = dispatcher
                .dispatch(&mut message, &session, Direction::Incoming)
                .unwrap();
            assert_eq!(outcome.is_delivered(), body != "spam");
        }

        logger.shutdown().await;

        let history = store.history(&StreamKey::new("lobby@conference.example.com"));
        let logged: Vec<(u64, Option<String>)> = history
            .iter()
            .map(|e| (e.sequence.value(), e.body.clone()))
            .collect();
        assert_eq!(
            logged,
            vec![
                (1, Some("one".to_string())),
                (3, Some("two".to_string())),
                (4, Some("three".to_string())),
            ]
        );
        assert_eq!(history[0].sender.to_string(), "romeo@example.com/orchard");
        // Sent to the bare room: no occupant address, so no nickname.
        assert_eq!(history[0].nickname, None);
        assert_eq!(sequencing.assigned_total(), 4);
    }

    #[tokio::test]
    async fn test_store_failure_loses_batch_but_not_numbering() {
        let store = Arc::new(InMemoryConversationStore::new());
        let logger = Arc::new(
            ConversationLogger::start(store.clone(), 1, Duration::from_millis(10)).unwrap(),
        );
        let sequencing = Arc::new(
            SequencingInterceptor::new(
                Arc::new(LocalSequenceAssigner::new()),
                Arc::new(GroupChatStreamResolver::new("conference.example.com")),
            )
            .with_logger(logger.clone()),
        );
        let dispatcher = PipelineDispatcher::new(
            Arc::new(InterceptorRegistry::new()),
            Arc::new(Sink),
            Arc::new(Sink),
        )
        .with_builtin(sequencing);
        let session = SessionInfo::new(addr("romeo@example.com/orchard"), addr("example.com"));

        store.set_failing(true);
        let mut lost = room_message("lost");
        dispatcher
            .dispatch(&mut lost, &session, Direction::Incoming)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        store.set_failing(false);
        let mut kept = room_message("kept");
        assert!(matches!(
            dispatcher.dispatch(&mut kept, &session, Direction::Incoming),
            Ok(DispatchOutcome::Delivered)
        ));
        logger.shutdown().await;

        let history = store.history(&StreamKey::new("lobby@conference.example.com"));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sequence.value(), 2);
        assert_eq!(logger.stats().dropped(), 1);
    }

    // =============================================================================
    // TRAFFIC ACCOUNTING
    // =============================================================================

    #[test]
    fn test_counting_wrappers_share_one_counter() {
        let counter = Arc::new(TrafficCounter::new());

        let mut reader = CountingReader::new(&[0u8; 100][..], counter.clone());
        let mut sink = Vec::new();
        reader.read_to_end(&mut sink).unwrap();

        let mut writer = CountingWriter::new(Vec::new(), counter.clone());
        writer.write_all(&[0u8; 250]).unwrap();

        let sample = counter.sample(Duration::from_secs(60));
        assert_eq!(sample.incoming_bytes, 100);
        assert_eq!(sample.outgoing_bytes, 250);
        assert_eq!(
            sample.incoming_kb() + sample.outgoing_kb(),
            350.0 / 1024.0
        );

        let next = counter.sample(Duration::from_secs(60));
        assert_eq!(next.incoming_kb(), 0.0);
        assert_eq!(next.outgoing_kb(), 0.0);
    }

    #[test]
    fn test_increments_then_sample() {
        let counter = TrafficCounter::new();
        counter.add_incoming(100);
        counter.add_incoming(250);

        let sample = counter.sample(Duration::from_secs(60));
        assert_eq!(sample.incoming_kb(), 350.0 / 1024.0);
        assert_eq!(counter.sample(Duration::from_secs(60)).incoming_kb(), 0.0);
    }
}
