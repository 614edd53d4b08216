//! # Stanzas
//!
//! The unit of protocol traffic that flows through the pipeline: message,
//! presence or info/query. Header fields (`id`, `from`, `to`, `type`) are
//! typed; everything below the root lives in the extension tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::entities::{Address, SequenceNumber};

/// Default namespace of client-to-server stanzas.
pub const NS_CLIENT: &str = "jabber:client";

/// Namespace of defined stanza error conditions (RFC 6120 §8.3).
pub const NS_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

/// The three stanza variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StanzaKind {
    Message,
    Presence,
    InfoQuery,
}

impl StanzaKind {
    /// Root element name on the wire.
    pub fn element_name(self) -> &'static str {
        match self {
            StanzaKind::Message => "message",
            StanzaKind::Presence => "presence",
            StanzaKind::InfoQuery => "iq",
        }
    }
}

/// Anything that owns a list of extension elements.
///
/// Implemented by the stanza root and by plain elements, so code that
/// manipulates extensions does not care whether it works on a message's
/// top level or on an IQ's query child.
pub trait ExtensionHost {
    fn extensions(&self) -> &[Element];
    fn append_extension(&mut self, element: Element);
    fn retain_extensions(&mut self, keep: &mut dyn FnMut(&Element) -> bool) -> usize;
}

/// One stanza.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stanza {
    kind: StanzaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<Address>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    stanza_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    payload: Vec<Element>,
    /// Intake position, set by sequencing. Process-local, never on the wire.
    #[serde(skip)]
    sequence: Option<SequenceNumber>,
}

impl Stanza {
    pub fn new(kind: StanzaKind) -> Self {
        Self {
            kind,
            id: None,
            from: None,
            to: None,
            stanza_type: None,
            payload: Vec::new(),
            sequence: None,
        }
    }

    pub fn message() -> Self {
        Self::new(StanzaKind::Message)
    }

    pub fn presence() -> Self {
        Self::new(StanzaKind::Presence)
    }

    /// An IQ of the given type (`get`, `set`, `result`, `error`).
    pub fn iq(iq_type: &str) -> Self {
        Self::new(StanzaKind::InfoQuery).with_type(iq_type)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_type(mut self, stanza_type: impl Into<String>) -> Self {
        self.stanza_type = Some(stanza_type.into());
        self
    }

    pub fn with_payload(mut self, element: Element) -> Self {
        self.payload.push(element);
        self
    }

    /// Convenience for `<body/>` on messages.
    pub fn with_body(self, body: impl Into<String>) -> Self {
        self.with_payload(Element::new("body", NS_CLIENT).with_text(body))
    }

    pub fn kind(&self) -> StanzaKind {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn from(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    pub fn to(&self) -> Option<&Address> {
        self.to.as_ref()
    }

    pub fn set_from(&mut self, from: Address) {
        self.from = Some(from);
    }

    pub fn stanza_type(&self) -> Option<&str> {
        self.stanza_type.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.stanza_type() == Some("error")
    }

    pub fn sequence(&self) -> Option<SequenceNumber> {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: SequenceNumber) {
        self.sequence = Some(sequence);
    }

    /// The IQ payload element: the first child that is not an `<error/>`.
    ///
    /// Result and error IQs may legitimately have none.
    pub fn child_element(&self) -> Option<&Element> {
        if self.kind != StanzaKind::InfoQuery {
            return None;
        }
        self.payload.iter().find(|e| e.name() != "error")
    }

    pub fn child_element_mut(&mut self) -> Option<&mut Element> {
        if self.kind != StanzaKind::InfoQuery {
            return None;
        }
        self.payload.iter_mut().find(|e| e.name() != "error")
    }

    pub fn body(&self) -> Option<&str> {
        self.client_child_text("body")
    }

    pub fn subject(&self) -> Option<&str> {
        self.client_child_text("subject")
    }

    fn client_child_text(&self, name: &str) -> Option<&str> {
        self.payload
            .iter()
            .find(|e| e.is(name, NS_CLIENT))
            .and_then(Element::text)
    }

    /// Build the error reply for this stanza.
    ///
    /// `fallback_to` is used when the stanza carries no sender, `reply_from`
    /// when it carries no target. Returns `None` for stanzas that are errors
    /// themselves; answering those would start an error loop.
    pub fn error_reply(
        &self,
        fallback_to: &Address,
        reply_from: &Address,
        condition: StanzaErrorCondition,
        text: &str,
    ) -> Option<Stanza> {
        if self.is_error() {
            return None;
        }

        let mut reply = Stanza::new(self.kind).with_type("error");
        reply.id = self.id.clone();
        reply.to = Some(self.from.clone().unwrap_or_else(|| fallback_to.clone()));
        reply.from = Some(self.to.clone().unwrap_or_else(|| reply_from.clone()));

        if let Some(child) = self.child_element() {
            reply.payload.push(child.clone());
        }

        let mut error = Element::new("error", NS_CLIENT)
            .with_attr("type", condition.error_type().as_str())
            .with_child(Element::new(condition.as_str(), NS_STANZAS));
        if !text.is_empty() {
            error = error.with_child(Element::new("text", NS_STANZAS).with_text(text));
        }
        reply.payload.push(error);

        Some(reply)
    }
}

impl ExtensionHost for Stanza {
    fn extensions(&self) -> &[Element] {
        &self.payload
    }

    fn append_extension(&mut self, element: Element) {
        self.payload.push(element);
    }

    fn retain_extensions(&mut self, keep: &mut dyn FnMut(&Element) -> bool) -> usize {
        let before = self.payload.len();
        self.payload.retain(|e| keep(e));
        before - self.payload.len()
    }
}

impl ExtensionHost for Element {
    fn extensions(&self) -> &[Element] {
        self.children()
    }

    fn append_extension(&mut self, element: Element) {
        self.append_child(element);
    }

    fn retain_extensions(&mut self, keep: &mut dyn FnMut(&Element) -> bool) -> usize {
        self.retain_children(|e| keep(e))
    }
}

impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.kind.element_name())?;
        if let Some(id) = &self.id {
            write!(f, " id='{}'", id)?;
        }
        if let Some(t) = &self.stanza_type {
            write!(f, " type='{}'", t)?;
        }
        if let Some(from) = &self.from {
            write!(f, " from='{}'", from)?;
        }
        if let Some(to) = &self.to {
            write!(f, " to='{}'", to)?;
        }
        write!(f, "/>")
    }
}

/// Error `type` attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    Auth,
    Cancel,
    Continue,
    Modify,
    Wait,
}

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::Auth => "auth",
            ErrorType::Cancel => "cancel",
            ErrorType::Continue => "continue",
            ErrorType::Modify => "modify",
            ErrorType::Wait => "wait",
        }
    }
}

/// Defined stanza error conditions an interceptor may attach to a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StanzaErrorCondition {
    BadRequest,
    Forbidden,
    InternalServerError,
    NotAcceptable,
    NotAllowed,
    NotAuthorized,
    PolicyViolation,
    ResourceConstraint,
    ServiceUnavailable,
}

impl StanzaErrorCondition {
    /// Element name of the condition.
    pub fn as_str(self) -> &'static str {
        match self {
            StanzaErrorCondition::BadRequest => "bad-request",
            StanzaErrorCondition::Forbidden => "forbidden",
            StanzaErrorCondition::InternalServerError => "internal-server-error",
            StanzaErrorCondition::NotAcceptable => "not-acceptable",
            StanzaErrorCondition::NotAllowed => "not-allowed",
            StanzaErrorCondition::NotAuthorized => "not-authorized",
            StanzaErrorCondition::PolicyViolation => "policy-violation",
            StanzaErrorCondition::ResourceConstraint => "resource-constraint",
            StanzaErrorCondition::ServiceUnavailable => "service-unavailable",
        }
    }

    /// The error type RFC 6120 associates with the condition.
    pub fn error_type(self) -> ErrorType {
        match self {
            StanzaErrorCondition::BadRequest | StanzaErrorCondition::NotAcceptable => {
                ErrorType::Modify
            }
            StanzaErrorCondition::Forbidden | StanzaErrorCondition::NotAuthorized => {
                ErrorType::Auth
            }
            StanzaErrorCondition::InternalServerError
            | StanzaErrorCondition::NotAllowed
            | StanzaErrorCondition::ServiceUnavailable => ErrorType::Cancel,
            StanzaErrorCondition::PolicyViolation => ErrorType::Modify,
            StanzaErrorCondition::ResourceConstraint => ErrorType::Wait,
        }
    }
}
