//! # Server Runtime Library
//!
//! Exposes the runtime's modules for tests. The binary entry point is
//! `main.rs`.
//!
//! - `container/` - configuration and the subsystem container
//! - `adapters/` - in-memory sessions and the Prometheus reporter
//! - `runtime` - startup, stanza intake, shutdown

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod container;
pub mod errors;
pub mod runtime;

pub use container::{ConfigError, ServerConfig, ServerContainer};
pub use errors::{IngestError, RuntimeError};
pub use runtime::ServerRuntime;
