//! # Pipeline Integration Flows
//!
//! The interceptor registry, the dispatcher and the stanza id stamper working
//! together.
//!
//! ## Flows Tested
//!
//! 1. **Ordering**: global interceptors before per-principal ones, each run
//!    once before and once after processing
//! 2. **Incoming rejection**: never routed, one error reply to the sender
//! 3. **Outgoing rejection**: nothing transmitted, no reply
//! 4. **Stamping**: exactly one stanza id per stamping entity, even when the
//!    same stanza passes the pipeline twice

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use shared_types::{
        Address, DeliveryError, Direction, Element, ExtensionHost, InterceptResult, Phase,
        Principal, Rejection, SessionInfo, Stanza, StanzaErrorCondition, StanzaInterceptor,
        NS_STANZAS,
    };
    use xs_02_stanza_id::{
        find_stable_id, StampingConfig, StanzaIdInterceptor, StanzaIdStamper, NS_SID, STANZA_ID,
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

    fn user_session() -> SessionInfo {
        SessionInfo::new(addr("juliet@example.com/balcony"), addr("example.com"))
    }

    /// Records every call into a shared log.
    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        reject_pre: Option<Rejection>,
    }

    impl Recorder {
        fn new(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label,
                log,
                reject_pre: None,
            })
        }

        fn rejecting(label: &'static str, log: Arc<Mutex<Vec<String>>>, reason: &str) -> Arc<Self> {
            Arc::new(Self {
                label,
                log,
                reject_pre: Some(
                    Rejection::new(reason).with_condition(StanzaErrorCondition::PolicyViolation),
                ),
            })
        }
    }

    impl StanzaInterceptor for Recorder {
        fn intercept(
            &self,
            _stanza: &mut Stanza,
            _session: &SessionInfo,
            _direction: Direction,
            phase: Phase,
        ) -> InterceptResult {
            self.log.lock().push(format!("{}:{}", self.label, phase));
            match (&self.reject_pre, phase) {
                (Some(rejection), Phase::Pre) => InterceptResult::Rejected(rejection.clone()),
                _ => InterceptResult::Accepted,
            }
        }

        fn name(&self) -> &str {
            self.label
        }
    }

    #[derive(Default)]
    struct Wire {
        routed: Mutex<Vec<Stanza>>,
        sent: Mutex<Vec<Stanza>>,
    }

    impl StanzaRouter for Wire {
        fn route(&self, stanza: &Stanza, _session: &SessionInfo) -> Result<(), DeliveryError> {
            self.routed.lock().push(stanza.clone());
            Ok(())
        }
    }

    impl StanzaTransport for Wire {
        fn send(&self, stanza: &Stanza, _session: &SessionInfo) -> Result<(), DeliveryError> {
            self.sent.lock().push(stanza.clone());
            Ok(())
        }
    }

    fn pipeline(by: &str) -> (PipelineDispatcher, Arc<InterceptorRegistry>, Arc<Wire>) {
        let registry = Arc::new(InterceptorRegistry::new());
        let wire = Arc::new(Wire::default());
        let stamper = Arc::new(StanzaIdStamper::with_address(
            addr(by),
            Arc::new(StampingConfig::default().to_settings()),
        ));
        let dispatcher = PipelineDispatcher::new(registry.clone(), wire.clone(), wire.clone())
            .with_builtin(Arc::new(StanzaIdInterceptor::new(stamper)));
        (dispatcher, registry, wire)
    }

    fn stamps_by<'a>(stanza: &'a Stanza, by: &'a str) -> Vec<&'a Element> {
        stanza
            .extensions()
            .iter()
            .filter(|e| e.is(STANZA_ID, NS_SID) && e.attr("by") == Some(by))
            .collect()
    }

    // =============================================================================
    // ORDERING
    // =============================================================================

    #[test]
    fn test_global_before_principal_each_twice() {
        let (dispatcher, registry, _) = pipeline("example.com");
        let log = Arc::new(Mutex::new(Vec::new()));
        let session = user_session();

        registry.add_global(Recorder::new("G", log.clone()));
        registry.add_for_principal(&session.principal(), Recorder::new("P", log.clone()));

        let mut message = Stanza::message().with_to(addr("romeo@example.com"));
        let outcome = dispatcher
            .dispatch(&mut message, &session, Direction::Incoming)
            .unwrap();

        assert!(outcome.is_delivered());
        assert_eq!(*log.lock(), vec!["G:pre", "P:pre", "G:post", "P:post"]);
    }

    #[test]
    fn test_principal_chain_only_for_its_principal() {
        let (dispatcher, registry, _) = pipeline("example.com");
        let log = Arc::new(Mutex::new(Vec::new()));
        let juliet = Principal::from(&addr("juliet@example.com"));
        registry.add_for_principal(&juliet, Recorder::new("P", log.clone()));

        let romeo = SessionInfo::new(addr("romeo@example.com/orchard"), addr("example.com"));
        let mut message = Stanza::message().with_to(addr("juliet@example.com"));
        dispatcher
            .dispatch(&mut message, &romeo, Direction::Incoming)
            .unwrap();

        assert!(log.lock().is_empty());
    }

    // =============================================================================
    // REJECTION
    // =============================================================================

    #[test]
    fn test_incoming_rejection_replies_once_and_never_routes() {
        let (dispatcher, registry, wire) = pipeline("example.com");
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.add_global(Recorder::rejecting("deny", log.clone(), "no spam"));
        let after = Recorder::new("after", log.clone());
        registry.add_global(after);

        let session = user_session();
        let mut message = Stanza::message()
            .with_id("m1")
            .with_from(addr("juliet@example.com/balcony"))
            .with_to(addr("romeo@example.com"))
            .with_body("buy now");
        let outcome = dispatcher
            .dispatch(&mut message, &session, Direction::Incoming)
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::RejectedWithReply(_)));
        assert!(wire.routed.lock().is_empty());
        assert_eq!(*log.lock(), vec!["deny:pre"]);

        let sent = wire.sent.lock();
        assert_eq!(sent.len(), 1);
        let reply = &sent[0];
        assert!(reply.is_error());
        assert_eq!(reply.id(), Some("m1"));
        assert_eq!(reply.to(), Some(&addr("juliet@example.com/balcony")));
        let error = reply
            .extensions()
            .iter()
            .find(|e| e.name() == "error")
            .unwrap();
        assert!(error.get_child("policy-violation", NS_STANZAS).is_some());
        assert_eq!(
            error.get_child("text", NS_STANZAS).and_then(Element::text),
            Some("no spam")
        );
    }

    #[test]
    fn test_incoming_error_stanza_rejected_without_reply() {
        let (dispatcher, registry, wire) = pipeline("example.com");
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.add_global(Recorder::rejecting("deny", log, "no"));

        let mut bounce = Stanza::message()
            .with_type("error")
            .with_from(addr("juliet@example.com/balcony"));
        let outcome = dispatcher
            .dispatch(&mut bounce, &user_session(), Direction::Incoming)
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Dropped(_)));
        assert!(wire.sent.lock().is_empty());
        assert!(wire.routed.lock().is_empty());
    }

    #[test]
    fn test_outgoing_rejection_transmits_nothing() {
        let (dispatcher, registry, wire) = pipeline("example.com");
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.add_global(Recorder::rejecting("deny", log, "muted"));

        let mut message = Stanza::message()
            .with_from(addr("romeo@example.com/orchard"))
            .with_to(addr("juliet@example.com/balcony"));
        let outcome = dispatcher
            .dispatch(&mut message, &user_session(), Direction::Outgoing)
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Dropped(_)));
        assert!(wire.sent.lock().is_empty());
        assert!(wire.routed.lock().is_empty());
        assert_eq!(dispatcher.stats().snapshot().outgoing_rejected, 1);
    }

    // =============================================================================
    // STAMPING THROUGH THE PIPELINE
    // =============================================================================

    #[test]
    fn test_incoming_message_stamped_once() {
        let (dispatcher, _, wire) = pipeline("chat.example.com");
        let mut message = Stanza::message()
            .with_from(addr("juliet@example.com/balcony"))
            .with_to(addr("romeo@example.com"))
            .with_body("hi");

        dispatcher
            .dispatch(&mut message, &user_session(), Direction::Incoming)
            .unwrap();

        let stamps = stamps_by(&message, "chat.example.com");
        assert_eq!(stamps.len(), 1);
        let id = stamps[0].attr("id").unwrap();
        assert!(!id.is_empty());
        assert_eq!(
            find_stable_id(&message, &addr("chat.example.com")).as_deref(),
            Some(id)
        );
        assert_eq!(stamps_by(&wire.routed.lock()[0], "chat.example.com").len(), 1);
    }

    #[test]
    fn test_second_pass_replaces_stamp() {
        let (dispatcher, _, _) = pipeline("chat.example.com");
        let mut message = Stanza::message()
            .with_from(addr("juliet@example.com/balcony"))
            .with_to(addr("romeo@example.com"));

        dispatcher
            .dispatch(&mut message, &user_session(), Direction::Incoming)
            .unwrap();
        let first = find_stable_id(&message, &addr("chat.example.com")).unwrap();

        dispatcher
            .dispatch(&mut message, &user_session(), Direction::Incoming)
            .unwrap();
        let stamps = stamps_by(&message, "chat.example.com");
        assert_eq!(stamps.len(), 1);
        assert_ne!(stamps[0].attr("id"), Some(first.as_str()));
    }

    #[test]
    fn test_forged_stamp_from_client_is_replaced() {
        let (dispatcher, _, _) = pipeline("chat.example.com");
        let forged = Element::new(STANZA_ID, NS_SID)
            .with_attr("by", "chat.example.com")
            .with_attr("id", "forged");
        let foreign = Element::new(STANZA_ID, NS_SID)
            .with_attr("by", "elsewhere.example")
            .with_attr("id", "theirs");
        let mut message = Stanza::message()
            .with_from(addr("juliet@example.com/balcony"))
            .with_payload(forged)
            .with_payload(foreign);

        dispatcher
            .dispatch(&mut message, &user_session(), Direction::Incoming)
            .unwrap();

        let ours = stamps_by(&message, "chat.example.com");
        assert_eq!(ours.len(), 1);
        assert_ne!(ours[0].attr("id"), Some("forged"));
        assert_eq!(stamps_by(&message, "elsewhere.example").len(), 1);
    }

    #[test]
    fn test_outgoing_and_presence_not_stamped_by_default() {
        let (dispatcher, _, _) = pipeline("chat.example.com");

        let mut outgoing = Stanza::message().with_to(addr("juliet@example.com/balcony"));
        dispatcher
            .dispatch(&mut outgoing, &user_session(), Direction::Outgoing)
            .unwrap();
        assert!(find_stable_id(&outgoing, &addr("chat.example.com")).is_none());

        let mut presence = Stanza::presence().with_from(addr("juliet@example.com/balcony"));
        dispatcher
            .dispatch(&mut presence, &user_session(), Direction::Incoming)
            .unwrap();
        assert!(find_stable_id(&presence, &addr("chat.example.com")).is_none());
    }
}
