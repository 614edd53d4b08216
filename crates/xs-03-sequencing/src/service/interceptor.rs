//! Pipeline hook for sequencing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shared_types::{
    Direction, InterceptResult, Phase, Rejection, SessionInfo, Stanza, StanzaErrorCondition,
    StanzaInterceptor,
};
use tracing::{error, trace, warn};

use super::logger::ConversationLogger;
use crate::domain::ConversationLogEntry;
use crate::ports::{SequenceAssigner, StreamResolver};

/// Numbers incoming conversation stanzas and archives them once delivered.
///
/// In the pre phase the stanza gets its sequence number, unless it already
/// has one. In the post phase, which only runs if nothing rejected the
/// stanza, the entry is queued for the store. A rejected stanza therefore
/// leaves a gap and no entry.
pub struct SequencingInterceptor {
    assigner: Arc<dyn SequenceAssigner>,
    resolver: Arc<dyn StreamResolver>,
    logger: Option<Arc<ConversationLogger>>,
    assigned: AtomicU64,
}

impl SequencingInterceptor {
    pub fn new(assigner: Arc<dyn SequenceAssigner>, resolver: Arc<dyn StreamResolver>) -> Self {
        Self {
            assigner,
            resolver,
            logger: None,
            assigned: AtomicU64::new(0),
        }
    }

    /// Archive delivered stanzas through `logger`.
    pub fn with_logger(mut self, logger: Arc<ConversationLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Total numbers handed out by this interceptor.
    pub fn assigned_total(&self) -> u64 {
        self.assigned.load(Ordering::Relaxed)
    }

    fn assign(&self, stanza: &mut Stanza) -> InterceptResult {
        if stanza.sequence().is_some() {
            return InterceptResult::Accepted;
        }
        let Some(stream) = self.resolver.resolve(stanza) else {
            return InterceptResult::Accepted;
        };

        match self.assigner.next_sequence(&stream) {
            Ok(sequence) => {
                stanza.set_sequence(sequence);
                self.assigned.fetch_add(1, Ordering::Relaxed);
                trace!(stream = %stream, sequence = sequence.value(), "Sequence assigned");
                InterceptResult::Accepted
            }
            Err(e) => {
                error!(stream = %stream, error = %e, "Sequence assignment failed");
                InterceptResult::Rejected(
                    Rejection::new("unable to order message")
                        .with_condition(StanzaErrorCondition::InternalServerError),
                )
            }
        }
    }

    fn archive(&self, stanza: &Stanza, session: &SessionInfo) {
        let (Some(logger), Some(sequence)) = (&self.logger, stanza.sequence()) else {
            return;
        };
        let Some(stream) = self.resolver.resolve(stanza) else {
            return;
        };

        let entry = ConversationLogEntry::new(sequence, stream, stanza, session);
        if let Err(e) = logger.enqueue(entry) {
            warn!(sequence = sequence.value(), error = %e, "Conversation entry not queued");
        }
    }
}

impl StanzaInterceptor for SequencingInterceptor {
    fn intercept(
        &self,
        stanza: &mut Stanza,
        session: &SessionInfo,
        direction: Direction,
        phase: Phase,
    ) -> InterceptResult {
        if !direction.is_incoming() {
            return InterceptResult::Accepted;
        }
        match phase {
            Phase::Pre => self.assign(stanza),
            Phase::Post => {
                self.archive(stanza, session);
                InterceptResult::Accepted
            }
        }
    }

    fn name(&self) -> &str {
        "sequencing"
    }
}
