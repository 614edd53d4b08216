//! Stamping configuration.

use serde::{Deserialize, Serialize};

use crate::domain::StampingSettings;

/// Initial values of the stamping toggles.
///
/// Defaults: globally on, messages on, presences and IQs off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampingConfig {
    pub enabled: bool,
    pub message_enabled: bool,
    pub presence_enabled: bool,
    pub iq_enabled: bool,
}

impl Default for StampingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            message_enabled: true,
            presence_enabled: false,
            iq_enabled: false,
        }
    }
}

impl StampingConfig {
    /// Build the live toggles from these initial values.
    pub fn to_settings(&self) -> StampingSettings {
        let settings = StampingSettings::default();
        settings.set_enabled(self.enabled);
        settings.set_message_enabled(self.message_enabled);
        settings.set_presence_enabled(self.presence_enabled);
        settings.set_iq_enabled(self.iq_enabled);
        settings
    }
}
