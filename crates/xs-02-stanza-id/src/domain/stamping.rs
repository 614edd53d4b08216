//! Stamping and lookup of `<stanza-id/>` elements (XEP-0359).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shared_types::{Address, ConfigurationError, Element, ExtensionHost, Stanza, StanzaKind};
use tracing::{trace, warn};
use uuid::Uuid;

use super::errors::StampingError;
use super::settings::StampingSettings;

/// Namespace of unique and stable stanza identifiers.
pub const NS_SID: &str = "urn:xmpp:sid:0";

/// Element name of a stamping element.
pub const STANZA_ID: &str = "stanza-id";

/// What a call to [`StanzaIdStamper::stamp`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StampOutcome {
    /// A fresh element was attached; `replaced` older ones with our `by`
    /// were removed first.
    Stamped { id: String, replaced: usize },
    /// Stamping is switched off for this variant.
    Disabled,
    /// An IQ without a payload child; nothing to stamp.
    NoTarget,
}

impl StampOutcome {
    pub fn id(&self) -> Option<&str> {
        match self {
            StampOutcome::Stamped { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Stamps stanzas on behalf of one entity.
#[derive(Debug)]
pub struct StanzaIdStamper {
    by: Address,
    settings: Arc<StampingSettings>,
    stamped: AtomicU64,
}

impl StanzaIdStamper {
    /// Create a stamper for `self_address`.
    ///
    /// An empty or unparsable address is a configuration error.
    pub fn new(self_address: &str, settings: Arc<StampingSettings>) -> Result<Self, StampingError> {
        if self_address.trim().is_empty() {
            return Err(ConfigurationError::MissingAddress { role: STANZA_ID }.into());
        }
        let by = Address::parse(self_address)?;
        Ok(Self::with_address(by, settings))
    }

    pub fn with_address(by: Address, settings: Arc<StampingSettings>) -> Self {
        Self {
            by,
            settings,
            stamped: AtomicU64::new(0),
        }
    }

    pub fn by(&self) -> &Address {
        &self.by
    }

    pub fn settings(&self) -> &Arc<StampingSettings> {
        &self.settings
    }

    /// Total stanzas stamped by this instance.
    pub fn stamped_total(&self) -> u64 {
        self.stamped.load(Ordering::Relaxed)
    }

    /// Make sure the stanza carries exactly one fresh identifier from us.
    pub fn stamp(&self, stanza: &mut Stanza) -> StampOutcome {
        if !self.settings.applies_to(stanza.kind()) {
            return StampOutcome::Disabled;
        }

        let stanza_id = stanza.id().map(str::to_owned);
        let host: &mut dyn ExtensionHost = match stanza.kind() {
            StanzaKind::InfoQuery => match stanza.child_element_mut() {
                Some(child) => child as &mut dyn ExtensionHost,
                None => return StampOutcome::NoTarget,
            },
            _ => stanza as &mut dyn ExtensionHost,
        };

        let outcome = stamp_host(host, &self.by);
        if let StampOutcome::Stamped { id, replaced } = &outcome {
            self.stamped.fetch_add(1, Ordering::Relaxed);
            if *replaced > 0 {
                warn!(
                    stanza_id = stanza_id.as_deref().unwrap_or(""),
                    by = %self.by,
                    removed = replaced,
                    "Removed stanza-id element claiming to be ours"
                );
            }
            trace!(sid = %id, by = %self.by, "Stanza stamped");
        }
        outcome
    }
}

fn stamp_host(host: &mut dyn ExtensionHost, by: &Address) -> StampOutcome {
    let by_str = by.to_string();
    let replaced = host.retain_extensions(&mut |e: &Element| {
        !(e.is(STANZA_ID, NS_SID) && e.attr("by") == Some(by_str.as_str()))
    });

    let id = Uuid::new_v4().to_string();
    host.append_extension(
        Element::new(STANZA_ID, NS_SID)
            .with_attr("id", id.clone())
            .with_attr("by", by_str),
    );

    StampOutcome::Stamped { id, replaced }
}

/// The identifier `by` gave this stanza, if any.
///
/// Only top-level elements are considered, so an IQ stamped on its payload
/// child is not found here. Elements with an empty `id` are skipped.
pub fn find_stable_id(stanza: &Stanza, by: &Address) -> Option<String> {
    let by_str = by.to_string();
    stanza
        .extensions()
        .iter()
        .filter(|e| e.is(STANZA_ID, NS_SID) && e.attr("by") == Some(by_str.as_str()))
        .filter_map(|e| e.attr("id"))
        .find(|id| !id.trim().is_empty())
        .map(str::to_owned)
}
