//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Fatal misconfiguration detected while wiring the server.
///
/// These are never recovered from: the component that raises one refuses
/// to be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// An address could not be parsed.
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    /// A required address was empty.
    #[error("Missing address for {role}")]
    MissingAddress { role: &'static str },

    /// A numeric setting is outside its allowed range.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// The interceptor registry was asked to do something impossible.
    #[error("Invalid registry state: {0}")]
    Registry(String),
}

/// Failure to hand a stanza to the router or the wire.
///
/// This is the transport's concern; the pipeline only reports it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The target session is gone.
    #[error("Session {0} is closed")]
    SessionClosed(String),

    /// The router could not accept the stanza.
    #[error("Routing failed: {0}")]
    Routing(String),

    /// The underlying connection failed.
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl From<std::io::Error> for DeliveryError {
    fn from(err: std::io::Error) -> Self {
        DeliveryError::Transport(err.to_string())
    }
}
