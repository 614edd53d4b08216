//! Traffic monitor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default sampling interval in seconds.
pub const DEFAULT_SAMPLE_SECS: u64 = 60;

/// Configuration for the traffic monitor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Seconds between two samples.
    pub sample_interval_secs: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: DEFAULT_SAMPLE_SECS,
        }
    }
}

impl TrafficConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }
}
