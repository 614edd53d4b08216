//! Version query configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionQueryConfig {
    pub enabled: bool,
    /// Wait between resource binding and the query.
    pub delay_ms: u64,
}

impl Default for VersionQueryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 5_000,
        }
    }
}

impl VersionQueryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
