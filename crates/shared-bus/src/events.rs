//! # Server Events
//!
//! Defines all event types that flow through the shared bus.
//!
//! Events carry addresses, never live session handles. A consumer that needs
//! the connection re-resolves it when it acts on the event.

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerEvent {
    // =========================================================================
    // SESSION LIFECYCLE
    // =========================================================================
    /// A connection was accepted and authenticated.
    SessionCreated {
        /// Address of the new session.
        address: Address,
    },

    /// A session went away.
    SessionClosed {
        /// Address the session was bound to.
        address: Address,
    },

    // =========================================================================
    // RESOURCE BINDING
    // =========================================================================
    /// A client bound a resource; the session is about to become available.
    ResourceBound {
        /// Full address after binding.
        address: Address,
    },
}

impl ServerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::SessionCreated { .. } | Self::SessionClosed { .. } => {
                EventTopic::SessionLifecycle
            }
            Self::ResourceBound { .. } => EventTopic::ResourceBinding,
        }
    }

    /// The address the event is about.
    #[must_use]
    pub fn address(&self) -> &Address {
        match self {
            Self::SessionCreated { address }
            | Self::SessionClosed { address }
            | Self::ResourceBound { address } => address,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Session creation and teardown.
    SessionLifecycle,
    /// Resource binding.
    ResourceBinding,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Domains to include. Empty means all domains.
    pub domains: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            domains: Vec::new(),
        }
    }

    /// Restrict the filter to events about addresses in `domains`.
    #[must_use]
    pub fn for_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ServerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let domain_match =
            self.domains.is_empty() || self.domains.contains(&event.address().domain());

        topic_match && domain_match
    }
}
