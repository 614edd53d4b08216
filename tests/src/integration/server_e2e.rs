//! # Server End-to-End
//!
//! The assembled runtime: configuration, container, in-memory sessions,
//! the event bus and the metrics reporter.
//!
//! ## Flows Tested
//!
//! 1. Incoming message stamped by the configured domain and delivered
//! 2. Per-principal interceptor installed at runtime rejects with a reply
//! 3. Routed stanzas leave through each recipient's outgoing pass
//! 4. Resource binding triggers a deferred version query, unless the
//!    session is gone by then
//! 5. Subsystem counters reach Prometheus on report

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use shared_types::{
        Address, Direction, ExtensionHost, InterceptResult, Phase, SessionInfo, Stanza,
        StanzaInterceptor,
    };
    use server_runtime::{ServerConfig, ServerRuntime};
    use xs_02_stanza_id::{find_stable_id, NS_SID, STANZA_ID};
    use xs_04_interceptors::DispatchOutcome;
    use xs_05_version_query::{LiveSession, NS_VERSION};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn config(domain: &str) -> ServerConfig {
        let mut config = ServerConfig {
            domain: domain.to_string(),
            ..ServerConfig::default()
        };
        config.version_query.delay_ms = 1_000;
        config.sequencing.log_flush_ms = 10;
        config
    }

    fn wire(stanza: &Stanza) -> Vec<u8> {
        serde_json::to_vec(stanza).unwrap()
    }

    struct Muzzle;

    impl StanzaInterceptor for Muzzle {
        fn intercept(
            &self,
            _: &mut Stanza,
            _: &SessionInfo,
            direction: Direction,
            phase: Phase,
        ) -> InterceptResult {
            if phase == Phase::Pre && direction == Direction::Incoming {
                InterceptResult::reject("muted by moderator")
            } else {
                InterceptResult::Accepted
            }
        }
    }

    /// Keeps the outgoing calls it sees; refuses one recipient.
    struct Concierge {
        seen: Mutex<Vec<(String, Phase)>>,
        refuse: Address,
    }

    impl StanzaInterceptor for Concierge {
        fn intercept(
            &self,
            _: &mut Stanza,
            session: &SessionInfo,
            direction: Direction,
            phase: Phase,
        ) -> InterceptResult {
            if direction == Direction::Incoming {
                return InterceptResult::Accepted;
            }
            self.seen.lock().push((session.address.to_string(), phase));
            if phase == Phase::Pre && session.address == self.refuse {
                InterceptResult::reject("do not disturb")
            } else {
                InterceptResult::Accepted
            }
        }
    }

    // =============================================================================
    // STANZA FLOW
    // =============================================================================

    #[tokio::test]
    async fn test_message_stamped_by_server_domain() {
        let runtime = ServerRuntime::new(config("chat.example.com")).unwrap();
        let container = runtime.container();
        let romeo = container
            .sessions
            .open(addr("romeo@chat.example.com/orchard"))
            .await;
        let juliet = SessionInfo::new(
            addr("juliet@chat.example.com/balcony"),
            addr("chat.example.com"),
        );

        let message = Stanza::message()
            .with_id("wherefore")
            .with_from(addr("juliet@chat.example.com/balcony"))
            .with_to(addr("romeo@chat.example.com/orchard"))
            .with_body("Wherefore art thou?");
        let outcome = runtime.receive(&juliet, &wire(&message)).unwrap();
        assert!(outcome.is_delivered());

        let delivered = romeo.delivered();
        assert_eq!(delivered.len(), 1);
        let stamps: Vec<_> = delivered[0]
            .extensions()
            .iter()
            .filter(|e| e.is(STANZA_ID, NS_SID))
            .collect();
        assert_eq!(stamps.len(), 1);
        assert_eq!(stamps[0].attr("by"), Some("chat.example.com"));
        let id = stamps[0].attr("id").unwrap();
        assert!(!id.is_empty());
        assert_eq!(
            find_stable_id(&delivered[0], &addr("chat.example.com")).as_deref(),
            Some(id)
        );
    }

    #[tokio::test]
    async fn test_runtime_principal_interceptor_rejects_with_reply() {
        let runtime = ServerRuntime::new(config("example.com")).unwrap();
        let container = runtime.container();
        let juliet_addr = addr("juliet@example.com/balcony");
        let juliet = container.sessions.open(juliet_addr.clone()).await;
        let romeo = container
            .sessions
            .open(addr("romeo@example.com/orchard"))
            .await;

        let session = SessionInfo::new(juliet_addr.clone(), addr("example.com"));
        container
            .registry
            .add_for_principal(&session.principal(), Arc::new(Muzzle));

        let message = Stanza::message()
            .with_id("m1")
            .with_from(juliet_addr.clone())
            .with_to(addr("romeo@example.com/orchard"))
            .with_body("hello?");
        let outcome = runtime.receive(&session, &wire(&message)).unwrap();

        assert!(matches!(outcome, DispatchOutcome::RejectedWithReply(_)));
        assert!(romeo.delivered().is_empty());
        let replies = juliet.delivered();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].is_error());
        assert_eq!(replies[0].id(), Some("m1"));
    }

    #[tokio::test]
    async fn test_outgoing_send_reaches_session() {
        let runtime = ServerRuntime::new(config("example.com")).unwrap();
        let container = runtime.container();
        let juliet_addr = addr("juliet@example.com/balcony");
        let juliet = container.sessions.open(juliet_addr.clone()).await;

        let notice = Stanza::message()
            .with_from(addr("example.com"))
            .with_to(juliet_addr.clone())
            .with_body("maintenance at noon");
        let outcome = runtime
            .send(notice, &SessionInfo::new(juliet_addr, addr("example.com")))
            .unwrap();

        assert!(outcome.is_delivered());
        assert_eq!(juliet.delivered().len(), 1);
        assert!(container.traffic_counter.outgoing() > 0);
    }

    #[tokio::test]
    async fn test_bare_address_fans_out_through_outgoing_pass() {
        let runtime = ServerRuntime::new(config("example.com")).unwrap();
        let container = runtime.container();
        let balcony = container
            .sessions
            .open(addr("juliet@example.com/balcony"))
            .await;
        let garden = container
            .sessions
            .open(addr("juliet@example.com/garden"))
            .await;
        let romeo = SessionInfo::new(addr("romeo@example.com/orchard"), addr("example.com"));

        let concierge = Arc::new(Concierge {
            seen: Mutex::new(Vec::new()),
            refuse: addr("juliet@example.com/garden"),
        });
        container.registry.add_global(concierge.clone());

        let message = Stanza::message()
            .with_from(addr("romeo@example.com/orchard"))
            .with_to(addr("juliet@example.com"))
            .with_body("meet me at the gate");
        let outcome = runtime.receive(&romeo, &wire(&message)).unwrap();
        assert!(outcome.is_delivered());

        // The copy that reached the wire is the stamped one.
        let delivered = balcony.delivered();
        assert_eq!(delivered.len(), 1);
        assert!(find_stable_id(&delivered[0], &addr("example.com")).is_some());
        assert!(garden.delivered().is_empty());

        let mut seen = concierge.seen.lock().clone();
        seen.sort_by_key(|(address, _)| address.clone());
        assert_eq!(
            seen,
            vec![
                ("juliet@example.com/balcony".to_string(), Phase::Pre),
                ("juliet@example.com/balcony".to_string(), Phase::Post),
                ("juliet@example.com/garden".to_string(), Phase::Pre),
            ]
        );
        let stats = container.dispatcher.stats().snapshot();
        assert_eq!(stats.outgoing, 2);
        assert_eq!(stats.outgoing_rejected, 1);
    }

    // =============================================================================
    // DEFERRED VERSION QUERY
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_version_query_sent_after_delay() {
        let runtime = ServerRuntime::new(config("example.com")).unwrap();
        runtime.start().await.unwrap();
        let container = runtime.container();

        let juliet = container
            .sessions
            .open(addr("juliet@example.com/balcony"))
            .await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(juliet.delivered().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;

        let delivered = juliet.delivered();
        assert_eq!(delivered.len(), 1);
        let query = &delivered[0];
        assert_eq!(query.stanza_type(), Some("get"));
        assert_eq!(query.from(), Some(&addr("example.com")));
        assert_eq!(query.to(), Some(juliet.address()));
        assert!(query
            .child_element()
            .is_some_and(|c| c.is("query", NS_VERSION)));

        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_version_query_skipped_for_closed_session() {
        let runtime = ServerRuntime::new(config("example.com")).unwrap();
        runtime.start().await.unwrap();
        let container = runtime.container();

        let address = addr("juliet@example.com/balcony");
        let juliet = container.sessions.open(address.clone()).await;
        tokio::task::yield_now().await;
        assert!(container.sessions.close(&address).await);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        tokio::task::yield_now().await;

        assert!(juliet.delivered().is_empty());
        assert_eq!(container.version_query.queries_sent(), 0);

        runtime.shutdown().await;
    }

    // =============================================================================
    // METRICS
    // =============================================================================

    #[tokio::test]
    async fn test_counters_exported_to_prometheus() {
        let runtime = ServerRuntime::new(config("example.com")).unwrap();
        let container = runtime.container();
        container
            .sessions
            .open(addr("romeo@example.com/orchard"))
            .await;
        let juliet = SessionInfo::new(addr("juliet@example.com/balcony"), addr("example.com"));

        let message = Stanza::message()
            .with_from(addr("juliet@example.com/balcony"))
            .with_to(addr("romeo@example.com/orchard"));
        runtime.receive(&juliet, &wire(&message)).unwrap();

        let before = xs_telemetry::STANZA_IDS_STAMPED.get();
        container.reporter.export_counters();
        assert!(xs_telemetry::STANZA_IDS_STAMPED.get() >= before + 1.0);
        assert!(
            xs_telemetry::STANZAS_DISPATCHED
                .with_label_values(&["incoming"])
                .get()
                >= 1.0
        );
    }
}
