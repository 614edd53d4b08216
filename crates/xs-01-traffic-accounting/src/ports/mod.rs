//! Ports for traffic accounting.

pub mod outbound;

pub use outbound::TrafficReporter;
