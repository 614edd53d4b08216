//! Stream resolution for multi-user chat.

use shared_types::{Stanza, StanzaKind, StreamKey};

use crate::ports::StreamResolver;

/// Puts group-chat messages addressed to rooms of one chat service into the
/// room's stream. Everything else is unordered.
#[derive(Debug, Clone)]
pub struct GroupChatStreamResolver {
    service_domain: String,
}

impl GroupChatStreamResolver {
    pub fn new(service_domain: impl Into<String>) -> Self {
        Self {
            service_domain: service_domain.into(),
        }
    }

    pub fn service_domain(&self) -> &str {
        &self.service_domain
    }
}

impl StreamResolver for GroupChatStreamResolver {
    fn resolve(&self, stanza: &Stanza) -> Option<StreamKey> {
        if stanza.kind() != StanzaKind::Message || stanza.stanza_type() != Some("groupchat") {
            return None;
        }
        let to = stanza.to()?;
        if to.domain() != self.service_domain {
            return None;
        }
        Some(StreamKey::from(to))
    }
}
