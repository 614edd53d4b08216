//! Sequencing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for sequencing and the conversation log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencingConfig {
    /// This node's identity towards the block source.
    pub node_id: u32,
    /// Numbers reserved per round trip to the block source.
    /// Zero selects the single-node atomic assigner.
    pub block_size: u64,
    /// Entries written per store call.
    pub log_batch_size: usize,
    /// Longest time an entry waits in the queue.
    pub log_flush_ms: u64,
}

impl Default for SequencingConfig {
    fn default() -> Self {
        Self {
            node_id: 0,
            block_size: 0,
            log_batch_size: 50,
            log_flush_ms: 1000,
        }
    }
}

impl SequencingConfig {
    pub fn is_clustered(&self) -> bool {
        self.block_size > 0
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.log_flush_ms)
    }
}
