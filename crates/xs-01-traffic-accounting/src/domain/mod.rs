//! Domain layer for traffic accounting.

pub mod counter;
pub mod errors;

pub use counter::{TrafficCounter, TrafficSample};
pub use errors::MonitorError;
