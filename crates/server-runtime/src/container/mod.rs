//! # Server Container
//!
//! Configuration and the dependency container holding every subsystem.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, ServerConfig};
pub use subsystems::ServerContainer;
