//! Error types for the traffic monitor.

use thiserror::Error;

/// Errors from starting or stopping the traffic monitor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// `start` was called while the sampler is already running.
    #[error("Traffic monitor is already running")]
    AlreadyRunning,

    /// A zero sampling interval would spin.
    #[error("Sample interval must be greater than zero")]
    ZeroInterval,

    /// `start` was called outside a Tokio runtime.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}
