//! Adapters for sequencing ports.

pub mod memory;
pub mod resolver;

pub use memory::{InMemoryBlockSource, InMemoryConversationStore};
pub use resolver::GroupChatStreamResolver;
