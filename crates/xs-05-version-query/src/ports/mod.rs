//! Ports for the version query.

pub mod outbound;

pub use outbound::{LiveSession, SessionDirectory};
