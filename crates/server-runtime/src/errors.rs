//! Runtime error types.

use thiserror::Error;

use shared_types::{ConfigurationError, DeliveryError};
use xs_01_traffic_accounting::MonitorError;
use xs_02_stanza_id::StampingError;
use xs_03_sequencing::{ConversationLogError, SequenceError};

use crate::container::ConfigError;

/// Failures while building or starting the server.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Stanza id setup failed: {0}")]
    Stamping(#[from] StampingError),

    #[error("Sequencing setup failed: {0}")]
    Sequencing(#[from] SequenceError),

    #[error("Conversation log setup failed: {0}")]
    ConversationLog(#[from] ConversationLogError),

    #[error("Traffic monitor failed to start: {0}")]
    Monitor(#[from] MonitorError),
}

/// Failures while taking a stanza off a session's wire.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed stanza: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
