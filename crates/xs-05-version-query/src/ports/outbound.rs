//! Outbound Ports (Driven Ports)

use std::sync::Arc;

use shared_types::Address;

/// A connected session, looked up at the moment it is needed.
///
/// Only its liveness matters here; the query itself leaves through the
/// stanza pipeline like any other outgoing stanza.
pub trait LiveSession: Send + Sync {
    fn address(&self) -> &Address;

    fn is_closed(&self) -> bool;
}

/// Finds live sessions by their full address.
pub trait SessionDirectory: Send + Sync {
    fn find(&self, address: &Address) -> Option<Arc<dyn LiveSession>>;
}
