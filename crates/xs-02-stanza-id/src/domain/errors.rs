//! Error types for stanza stamping.

use shared_types::ConfigurationError;
use thiserror::Error;

/// Errors raised while constructing a stamper.
///
/// Stamping itself never fails; a stanza without a place for the element is
/// simply left alone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StampingError {
    /// The address we stamp with is unusable.
    #[error("Invalid stamping address: {0}")]
    InvalidSelfAddress(#[from] ConfigurationError),
}
