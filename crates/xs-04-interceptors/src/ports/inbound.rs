//! Inbound Ports (Driving Ports)
//!
//! What the connection layer calls for every stanza it reads or is about to
//! write.

use shared_types::{DeliveryError, Direction, SessionInfo, Stanza};

use crate::domain::DispatchOutcome;

/// Runs a stanza through interception and delivery.
pub trait StanzaPipeline: Send + Sync {
    /// Process one stanza travelling in `direction` through `session`.
    ///
    /// Rejections are part of the `Ok` outcome. `Err` means the router or
    /// the transport failed to take the stanza or the error reply.
    fn dispatch(
        &self,
        stanza: &mut Stanza,
        session: &SessionInfo,
        direction: Direction,
    ) -> Result<DispatchOutcome, DeliveryError>;
}
