//! Pipeline hook for stamping.

use std::sync::Arc;

use shared_types::{
    Direction, InterceptResult, Phase, PhaseFilter, SessionInfo, Stanza, StanzaInterceptor,
};

use crate::domain::StanzaIdStamper;

/// Stamps every incoming stanza before it is routed.
///
/// Outgoing stanzas were stamped when they entered the server and are left
/// alone.
pub struct StanzaIdInterceptor {
    stamper: Arc<StanzaIdStamper>,
}

impl StanzaIdInterceptor {
    pub fn new(stamper: Arc<StanzaIdStamper>) -> Self {
        Self { stamper }
    }

    pub fn stamper(&self) -> &Arc<StanzaIdStamper> {
        &self.stamper
    }
}

impl StanzaInterceptor for StanzaIdInterceptor {
    fn intercept(
        &self,
        stanza: &mut Stanza,
        _session: &SessionInfo,
        direction: Direction,
        phase: Phase,
    ) -> InterceptResult {
        if direction.is_incoming() && phase == Phase::Pre {
            let _ = self.stamper.stamp(stanza);
        }
        InterceptResult::Accepted
    }

    fn phases(&self) -> PhaseFilter {
        PhaseFilter::PreOnly
    }

    fn name(&self) -> &str {
        "stanza-id"
    }
}
