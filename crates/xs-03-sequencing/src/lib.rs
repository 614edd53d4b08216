//! # XS-03 Sequencing
//!
//! Gives every stanza of a conversation its place in history.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `LocalSequenceAssigner`: one atomic counter per stream
//!   - `BlockSequenceAssigner`: hands numbers out of blocks reserved from a
//!     cluster-wide `SequenceBlockSource`
//!   - `ConversationLogEntry`: what gets archived
//! - **Ports Layer** (`ports/`)
//!   - `SequenceAssigner` (inbound), `SequenceBlockSource`,
//!     `ConversationStore` and `StreamResolver` (outbound)
//! - **Service Layer** (`service/`)
//!   - `ConversationLogger`: queues entries and flushes them in batches
//!   - `SequencingInterceptor`: assigns at intake, logs after delivery
//! - **Adapters Layer** (`adapters/`): in-memory block source and store,
//!   group-chat stream resolver
//!
//! ## Invariants
//!
//! - A number is assigned once per stanza, at intake, before anything
//!   asynchronous happens to the stanza.
//! - Numbers never decrease or repeat within a stream. Gaps are allowed:
//!   a rejected stanza or a failed flush leaves one.
//! - The store may batch and reorder writes; readers order by number.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{GroupChatStreamResolver, InMemoryBlockSource, InMemoryConversationStore};
pub use config::SequencingConfig;
pub use domain::{
    BlockSequenceAssigner, ConversationLogEntry, ConversationLogError, LocalSequenceAssigner,
    SequenceError,
};
pub use ports::{ConversationStore, SequenceAssigner, SequenceBlockSource, StreamResolver};
pub use service::{ConversationLogger, LoggerStats, SequencingInterceptor};
