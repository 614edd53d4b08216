//! Domain layer for sequencing.

pub mod assigner;
pub mod entry;
pub mod errors;

pub use assigner::{BlockSequenceAssigner, LocalSequenceAssigner};
pub use entry::ConversationLogEntry;
pub use errors::{ConversationLogError, SequenceError};
