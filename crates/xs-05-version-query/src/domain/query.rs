//! The `jabber:iq:version` request.

use shared_types::{Address, Element, Stanza};
use uuid::Uuid;

/// Namespace of software version queries.
pub const NS_VERSION: &str = "jabber:iq:version";

/// An IQ get asking `to` for its software version.
pub fn version_query(from: &Address, to: &Address) -> Stanza {
    Stanza::iq("get")
        .with_id(format!("ver-{}", Uuid::new_v4().simple()))
        .with_from(from.clone())
        .with_to(to.clone())
        .with_payload(Element::new("query", NS_VERSION))
}
