//! Error types for the interceptor registry.

use shared_types::ConfigurationError;
use thiserror::Error;

/// Errors from registry mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Insert position past the end of the list.
    #[error("Index {index} out of range for {len} interceptors")]
    IndexOutOfRange { index: usize, len: usize },
}

impl From<RegistryError> for ConfigurationError {
    fn from(err: RegistryError) -> Self {
        ConfigurationError::Registry(err.to_string())
    }
}
