//! Ports for sequencing.

pub mod inbound;
pub mod outbound;

pub use inbound::SequenceAssigner;
pub use outbound::{ConversationStore, SequenceBlockSource, StreamResolver};
