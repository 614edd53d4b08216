//! Dispatch results and counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use shared_types::{Direction, Rejection};

/// What happened to one stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to the router (incoming) or the wire (outgoing).
    Delivered,
    /// Incoming stanza refused; the sender got an error reply instead.
    RejectedWithReply(Rejection),
    /// Refused without a reply: outgoing stanzas, and incoming stanzas that
    /// were errors themselves.
    Dropped(Rejection),
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            DispatchOutcome::Delivered => None,
            DispatchOutcome::RejectedWithReply(r) | DispatchOutcome::Dropped(r) => Some(r),
        }
    }
}

/// Running totals for one dispatcher.
#[derive(Debug, Default)]
pub struct DispatchStats {
    incoming: AtomicU64,
    outgoing: AtomicU64,
    incoming_rejected: AtomicU64,
    outgoing_rejected: AtomicU64,
    replies_sent: AtomicU64,
    post_faults: AtomicU64,
    delivery_failures: AtomicU64,
}

impl DispatchStats {
    pub(crate) fn record_dispatch(&self, direction: Direction) {
        match direction {
            Direction::Incoming => self.incoming.fetch_add(1, Ordering::Relaxed),
            Direction::Outgoing => self.outgoing.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub(crate) fn record_rejection(&self, direction: Direction) {
        match direction {
            Direction::Incoming => self.incoming_rejected.fetch_add(1, Ordering::Relaxed),
            Direction::Outgoing => self.outgoing_rejected.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub(crate) fn record_reply(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_post_fault(&self) {
        self.post_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            incoming: self.incoming.load(Ordering::Relaxed),
            outgoing: self.outgoing.load(Ordering::Relaxed),
            incoming_rejected: self.incoming_rejected.load(Ordering::Relaxed),
            outgoing_rejected: self.outgoing_rejected.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            post_faults: self.post_faults.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStatsSnapshot {
    pub incoming: u64,
    pub outgoing: u64,
    pub incoming_rejected: u64,
    pub outgoing_rejected: u64,
    pub replies_sent: u64,
    pub post_faults: u64,
    pub delivery_failures: u64,
}
