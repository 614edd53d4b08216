//! # Adapters
//!
//! Port implementations connecting the subsystems to this process.

pub mod metrics;
pub mod sessions;

pub use metrics::PrometheusReporter;
pub use sessions::{InMemorySessionRegistry, MemorySession};
