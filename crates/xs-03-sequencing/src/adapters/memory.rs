//! In-memory implementations of the sequencing ports.
//!
//! Used for single-process deployments and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::StreamKey;
use tracing::trace;

use crate::domain::{ConversationLogEntry, ConversationLogError, SequenceError};
use crate::ports::{ConversationStore, SequenceBlockSource};

/// A single reservation mark shared by every stream and node, plus the
/// highest number claimed per stream.
///
/// Blocks come out in increasing order, so a fresh block always starts above
/// every claimed number.
#[derive(Debug, Default)]
pub struct InMemoryBlockSource {
    high_water: AtomicU64,
    reservations: AtomicU64,
    claimed: Mutex<HashMap<StreamKey, u64>>,
}

impl InMemoryBlockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks handed out so far.
    pub fn reservations(&self) -> u64 {
        self.reservations.load(Ordering::Relaxed)
    }

    /// Highest number claimed for `stream`, 0 if none.
    pub fn claimed(&self, stream: &StreamKey) -> u64 {
        self.claimed.lock().get(stream).copied().unwrap_or(0)
    }
}

impl SequenceBlockSource for InMemoryBlockSource {
    fn reserve_block(
        &self,
        node_id: u32,
        stream: &StreamKey,
        size: u64,
    ) -> Result<u64, SequenceError> {
        let previous = self
            .high_water
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |hw| hw.checked_add(size))
            .map_err(|_| SequenceError::Exhausted {
                stream: stream.clone(),
            })?;
        self.reservations.fetch_add(1, Ordering::Relaxed);
        trace!(node_id, stream = %stream, start = previous + 1, "Block handed out");
        Ok(previous + 1)
    }

    fn claim(&self, stream: &StreamKey, value: u64) -> Result<bool, SequenceError> {
        let mut claimed = self.claimed.lock();
        let mark = claimed.entry(stream.clone()).or_insert(0);
        if value <= *mark {
            return Ok(false);
        }
        *mark = value;
        Ok(true)
    }
}

/// Conversation history kept in a map, per stream.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    entries: RwLock<HashMap<StreamKey, Vec<ConversationLogEntry>>>,
    batches: AtomicU64,
    failing: AtomicBool,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The history of `stream`, ordered by sequence number.
    pub fn history(&self, stream: &StreamKey) -> Vec<ConversationLogEntry> {
        let mut entries = self
            .entries
            .read()
            .get(stream)
            .cloned()
            .unwrap_or_default();
        entries.sort_by_key(|e| e.sequence);
        entries
    }

    pub fn total_entries(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    /// Number of `append_batch` calls that succeeded.
    pub fn batches_written(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Make subsequent writes fail, to exercise error paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append_batch(
        &self,
        entries: Vec<ConversationLogEntry>,
    ) -> Result<(), ConversationLogError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(ConversationLogError::Store("store unavailable".to_string()));
        }

        let mut map = self.entries.write();
        // Reverse to mimic a backend that does not preserve insertion order.
        for entry in entries.into_iter().rev() {
            map.entry(entry.stream.clone()).or_default().push(entry);
        }
        self.batches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
