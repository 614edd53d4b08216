//! Outbound Ports (Driven Ports)
//!
//! Dependencies the sequencing subsystem needs from outside: cluster
//! coordination, persistence, and the policy deciding which stanzas belong
//! to an ordered stream.

use async_trait::async_trait;
use shared_types::{Stanza, StreamKey};

use crate::domain::{ConversationLogEntry, ConversationLogError, SequenceError};

/// Cluster-wide reservation of number blocks.
///
/// Successive reservations must return increasing, non-overlapping ranges,
/// and every new block must start above any number already claimed for the
/// stream.
pub trait SequenceBlockSource: Send + Sync {
    /// Reserve `size` numbers for `stream` on behalf of `node_id`.
    ///
    /// Returns the first number of the block.
    fn reserve_block(&self, node_id: u32, stream: &StreamKey, size: u64)
        -> Result<u64, SequenceError>;

    /// Publish `value` as the stream's cluster-wide high-water mark.
    ///
    /// Atomic compare-and-raise: succeeds only when `value` is above every
    /// number claimed for the stream so far, on any node. `Ok(false)` means
    /// another node has moved past the caller's block.
    fn claim(&self, stream: &StreamKey, value: u64) -> Result<bool, SequenceError>;
}

/// Durable storage of conversation history.
///
/// A batch may be written in any order; entries carry their number.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append_batch(&self, entries: Vec<ConversationLogEntry>)
        -> Result<(), ConversationLogError>;
}

/// Decides which ordered stream, if any, a stanza belongs to.
pub trait StreamResolver: Send + Sync {
    fn resolve(&self, stanza: &Stanza) -> Option<StreamKey>;
}
