//! Inbound Ports (Driving Ports)

use shared_types::{SequenceNumber, StreamKey};

use crate::domain::SequenceError;

/// Hands out the next position in a stream.
///
/// Called exactly once per stanza at acceptance. Implementations must be
/// linearizable per stream: among all calls for one key, later calls get
/// strictly larger numbers.
pub trait SequenceAssigner: Send + Sync {
    fn next_sequence(&self, stream: &StreamKey) -> Result<SequenceNumber, SequenceError>;
}
