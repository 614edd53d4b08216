//! Live stamping toggles.

use std::sync::atomic::{AtomicBool, Ordering};

use shared_types::StanzaKind;

/// Global and per-variant switches for stamping.
///
/// Read on every stamp, so flipping a switch takes effect for the next
/// stanza without restarting anything.
#[derive(Debug)]
pub struct StampingSettings {
    enabled: AtomicBool,
    message: AtomicBool,
    presence: AtomicBool,
    iq: AtomicBool,
}

impl Default for StampingSettings {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            message: AtomicBool::new(true),
            presence: AtomicBool::new(false),
            iq: AtomicBool::new(false),
        }
    }
}

impl StampingSettings {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, value: bool) {
        self.enabled.store(value, Ordering::Relaxed);
    }

    pub fn set_message_enabled(&self, value: bool) {
        self.message.store(value, Ordering::Relaxed);
    }

    pub fn set_presence_enabled(&self, value: bool) {
        self.presence.store(value, Ordering::Relaxed);
    }

    pub fn set_iq_enabled(&self, value: bool) {
        self.iq.store(value, Ordering::Relaxed);
    }

    /// Whether a stanza of this variant should be stamped right now.
    pub fn applies_to(&self, kind: StanzaKind) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let toggle = match kind {
            StanzaKind::Message => &self.message,
            StanzaKind::Presence => &self.presence,
            StanzaKind::InfoQuery => &self.iq,
        };
        toggle.load(Ordering::Relaxed)
    }
}
