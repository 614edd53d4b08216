//! Error types for the version query.

use shared_types::DeliveryError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionQueryError {
    /// The session would not take the query.
    #[error("Failed to deliver version query: {0}")]
    Delivery(#[from] DeliveryError),

    /// Scheduling needs a Tokio runtime.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}
