//! Outbound Ports (Driven Ports)
//!
//! Where drained samples are sent. The runtime plugs the metrics registry in
//! here.

use crate::domain::TrafficSample;

/// Receives one sample per sampling window.
pub trait TrafficReporter: Send + Sync {
    fn report(&self, sample: &TrafficSample);
}
