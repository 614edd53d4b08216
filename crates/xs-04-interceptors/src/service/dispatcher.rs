//! # Pipeline Dispatcher
//!
//! Orchestrates one stanza: pre-processing, delivery, post-processing.
//! Everything runs synchronously on the caller's thread.

use std::sync::Arc;

use shared_types::{
    DeliveryError, Direction, InterceptResult, Phase, Rejection, SessionInfo, Stanza,
    StanzaInterceptor,
};
use tracing::{debug, info, warn};

use crate::domain::{DispatchOutcome, DispatchStats, InterceptorChain, InterceptorRegistry};
use crate::ports::{StanzaPipeline, StanzaRouter, StanzaTransport};

/// The stanza pipeline.
///
/// Built-in interceptors (stamping, sequencing) run after everything in the
/// registry and cannot be removed at runtime.
pub struct PipelineDispatcher {
    registry: Arc<InterceptorRegistry>,
    builtins: Vec<Arc<dyn StanzaInterceptor>>,
    router: Arc<dyn StanzaRouter>,
    transport: Arc<dyn StanzaTransport>,
    stats: DispatchStats,
}

impl PipelineDispatcher {
    pub fn new(
        registry: Arc<InterceptorRegistry>,
        router: Arc<dyn StanzaRouter>,
        transport: Arc<dyn StanzaTransport>,
    ) -> Self {
        Self {
            registry,
            builtins: Vec::new(),
            router,
            transport,
            stats: DispatchStats::default(),
        }
    }

    /// Append a built-in interceptor.
    pub fn with_builtin(mut self, interceptor: Arc<dyn StanzaInterceptor>) -> Self {
        self.builtins.push(interceptor);
        self
    }

    pub fn registry(&self) -> &Arc<InterceptorRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    fn invocations<'a>(
        &'a self,
        chain: &'a InterceptorChain,
        phase: Phase,
    ) -> impl Iterator<Item = &'a Arc<dyn StanzaInterceptor>> + 'a {
        chain
            .iter()
            .chain(self.builtins.iter())
            .filter(move |i| i.phases().includes(phase))
    }

    fn run_pre(
        &self,
        chain: &InterceptorChain,
        stanza: &mut Stanza,
        session: &SessionInfo,
        direction: Direction,
    ) -> Option<(String, Rejection)> {
        for interceptor in self.invocations(chain, Phase::Pre) {
            if let InterceptResult::Rejected(rejection) =
                interceptor.intercept(stanza, session, direction, Phase::Pre)
            {
                return Some((interceptor.name().to_string(), rejection));
            }
        }
        None
    }

    fn run_post(
        &self,
        chain: &InterceptorChain,
        stanza: &mut Stanza,
        session: &SessionInfo,
        direction: Direction,
    ) {
        for interceptor in self.invocations(chain, Phase::Post) {
            if let InterceptResult::Rejected(rejection) =
                interceptor.intercept(stanza, session, direction, Phase::Post)
            {
                self.stats.record_post_fault();
                warn!(
                    interceptor = interceptor.name(),
                    stanza_id = stanza.id().unwrap_or(""),
                    principal = %session.principal(),
                    direction = %direction,
                    reason = %rejection,
                    "Rejection after processing ignored"
                );
            }
        }
    }

    fn deliver(
        &self,
        stanza: &Stanza,
        session: &SessionInfo,
        direction: Direction,
    ) -> Result<(), DeliveryError> {
        match direction {
            Direction::Incoming => self.router.route(stanza, session),
            Direction::Outgoing => self.transport.send(stanza, session),
        }
    }

    fn reject(
        &self,
        stanza: &Stanza,
        session: &SessionInfo,
        direction: Direction,
        interceptor: &str,
        rejection: Rejection,
    ) -> Result<DispatchOutcome, DeliveryError> {
        self.stats.record_rejection(direction);

        if direction == Direction::Outgoing {
            info!(
                interceptor,
                stanza_id = stanza.id().unwrap_or(""),
                principal = %session.principal(),
                reason = %rejection,
                "Outgoing stanza dropped"
            );
            return Ok(DispatchOutcome::Dropped(rejection));
        }

        let reply = stanza.error_reply(
            &session.address,
            &session.server_domain,
            rejection.condition_or_default(),
            rejection.reason(),
        );
        let Some(reply) = reply else {
            debug!(
                interceptor,
                stanza_id = stanza.id().unwrap_or(""),
                principal = %session.principal(),
                reason = %rejection,
                "Rejected error stanza dropped without reply"
            );
            return Ok(DispatchOutcome::Dropped(rejection));
        };

        debug!(
            interceptor,
            stanza_id = stanza.id().unwrap_or(""),
            principal = %session.principal(),
            reason = %rejection,
            "Incoming stanza rejected, replying with error"
        );
        // The reply goes straight to the sender's connection; running it
        // through the outgoing chain could reject it again.
        self.transport.send(&reply, session)?;
        self.stats.record_reply();
        Ok(DispatchOutcome::RejectedWithReply(rejection))
    }
}

impl StanzaPipeline for PipelineDispatcher {
    fn dispatch(
        &self,
        stanza: &mut Stanza,
        session: &SessionInfo,
        direction: Direction,
    ) -> Result<DispatchOutcome, DeliveryError> {
        self.stats.record_dispatch(direction);
        let chain = self.registry.resolve(&session.principal());

        if let Some((interceptor, rejection)) = self.run_pre(&chain, stanza, session, direction) {
            return self.reject(stanza, session, direction, &interceptor, rejection);
        }

        if let Err(e) = self.deliver(stanza, session, direction) {
            self.stats.record_delivery_failure();
            warn!(
                stanza_id = stanza.id().unwrap_or(""),
                principal = %session.principal(),
                direction = %direction,
                error = %e,
                "Delivery failed, skipping post-processing"
            );
            return Err(e);
        }

        self.run_post(&chain, stanza, session, direction);
        Ok(DispatchOutcome::Delivered)
    }
}
