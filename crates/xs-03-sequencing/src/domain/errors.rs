//! Error types for sequencing and conversation logging.

use shared_types::StreamKey;
use thiserror::Error;

/// Errors from assigning a sequence number.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The block source could not reserve a block.
    #[error("Block reservation failed for stream {stream}: {reason}")]
    BlockReservation { stream: StreamKey, reason: String },

    /// The 64-bit space of a stream ran out.
    #[error("Sequence space exhausted for stream {stream}")]
    Exhausted { stream: StreamKey },

    /// Blocks must hold at least one number.
    #[error("Block size must be greater than zero")]
    InvalidBlockSize,
}

/// Errors from queueing or persisting conversation log entries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversationLogError {
    /// The logger was shut down.
    #[error("Conversation logger is closed")]
    Closed,

    /// The store rejected a batch.
    #[error("Conversation store failure: {0}")]
    Store(String),

    /// The logger was started outside a Tokio runtime.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}
