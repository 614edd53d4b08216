//! Sequence number generators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use shared_types::{SequenceNumber, StreamKey};
use tracing::debug;

use super::errors::SequenceError;
use crate::ports::{SequenceAssigner, SequenceBlockSource};

// =============================================================================
// SINGLE NODE
// =============================================================================

/// One atomic counter per stream. Numbers start at 1.
#[derive(Debug, Default)]
pub struct LocalSequenceAssigner {
    streams: RwLock<HashMap<StreamKey, Arc<AtomicU64>>>,
}

impl LocalSequenceAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, stream: &StreamKey) -> Arc<AtomicU64> {
        if let Some(counter) = self.streams.read().get(stream) {
            return counter.clone();
        }
        self.streams
            .write()
            .entry(stream.clone())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    }
}

impl SequenceAssigner for LocalSequenceAssigner {
    fn next_sequence(&self, stream: &StreamKey) -> Result<SequenceNumber, SequenceError> {
        let counter = self.counter(stream);
        let previous = counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1))
            .map_err(|_| SequenceError::Exhausted {
                stream: stream.clone(),
            })?;
        Ok(SequenceNumber(previous + 1))
    }
}

// =============================================================================
// CLUSTER
// =============================================================================

/// Attempts at finding a usable block before giving up on one call.
const MAX_CLAIM_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Block {
    next: u64,
    end: u64,
}

/// Hands numbers out of blocks reserved from a cluster-wide source.
///
/// Each stream keeps its own current block. Every number is claimed against
/// the source's per-stream high-water mark before it is returned; when
/// another node has already claimed a higher number, the rest of the local
/// block is discarded and a fresh one is reserved. Numbers therefore follow
/// arrival order across nodes, at the cost of gaps.
pub struct BlockSequenceAssigner {
    source: Arc<dyn SequenceBlockSource>,
    node_id: u32,
    block_size: u64,
    blocks: Mutex<HashMap<StreamKey, Block>>,
    stale_blocks: AtomicU64,
}

impl BlockSequenceAssigner {
    pub fn new(
        source: Arc<dyn SequenceBlockSource>,
        node_id: u32,
        block_size: u64,
    ) -> Result<Self, SequenceError> {
        if block_size == 0 {
            return Err(SequenceError::InvalidBlockSize);
        }
        Ok(Self {
            source,
            node_id,
            block_size,
            blocks: Mutex::new(HashMap::new()),
            stale_blocks: AtomicU64::new(0),
        })
    }

    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Blocks abandoned because another node moved past them.
    pub fn stale_blocks(&self) -> u64 {
        self.stale_blocks.load(Ordering::Relaxed)
    }

    fn current_block<'a>(
        &self,
        blocks: &'a mut HashMap<StreamKey, Block>,
        stream: &StreamKey,
    ) -> Result<&'a mut Block, SequenceError> {
        let exhausted = blocks.get(stream).map_or(true, |b| b.next >= b.end);
        if exhausted {
            let start = self
                .source
                .reserve_block(self.node_id, stream, self.block_size)?;
            let end = start
                .checked_add(self.block_size)
                .ok_or_else(|| SequenceError::Exhausted {
                    stream: stream.clone(),
                })?;
            if let Some(previous) = blocks.get(stream) {
                if start < previous.end {
                    return Err(SequenceError::BlockReservation {
                        stream: stream.clone(),
                        reason: format!(
                            "block starting at {start} overlaps previous block ending at {}",
                            previous.end
                        ),
                    });
                }
            }
            debug!(
                node_id = self.node_id,
                stream = %stream,
                start = start,
                size = self.block_size,
                "Reserved sequence block"
            );
            blocks.insert(stream.clone(), Block { next: start, end });
        }

        blocks
            .get_mut(stream)
            .ok_or_else(|| SequenceError::Exhausted {
                stream: stream.clone(),
            })
    }
}

impl SequenceAssigner for BlockSequenceAssigner {
    fn next_sequence(&self, stream: &StreamKey) -> Result<SequenceNumber, SequenceError> {
        let mut blocks = self.blocks.lock();

        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let block = self.current_block(&mut blocks, stream)?;
            let value = block.next;
            if self.source.claim(stream, value)? {
                block.next += 1;
                return Ok(SequenceNumber(value));
            }

            // Handing out the rest of this block would go backwards.
            debug!(
                node_id = self.node_id,
                stream = %stream,
                skipped = block.end - value,
                "Discarding stale sequence block"
            );
            block.next = block.end;
            self.stale_blocks.fetch_add(1, Ordering::Relaxed);
        }

        Err(SequenceError::BlockReservation {
            stream: stream.clone(),
            reason: format!("no block could be claimed after {MAX_CLAIM_ATTEMPTS} attempts"),
        })
    }
}
