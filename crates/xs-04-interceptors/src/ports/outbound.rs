//! Outbound Ports (Driven Ports)

use shared_types::{DeliveryError, SessionInfo, Stanza};

/// Takes incoming stanzas that passed pre-processing.
///
/// The router must accept stanzas that already carry identifiers.
pub trait StanzaRouter: Send + Sync {
    fn route(&self, stanza: &Stanza, session: &SessionInfo) -> Result<(), DeliveryError>;
}

/// Writes outgoing stanzas, and error replies, to a session's connection.
pub trait StanzaTransport: Send + Sync {
    fn send(&self, stanza: &Stanza, session: &SessionInfo) -> Result<(), DeliveryError>;
}
