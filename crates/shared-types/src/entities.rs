//! # Core Domain Entities
//!
//! Addressing and session identity shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Addressing**: `Address`, `Principal`
//! - **Ordering**: `StreamKey`, `SequenceNumber`
//! - **Sessions**: `SessionInfo`, `Direction`

use std::fmt;
use std::str::FromStr;

use jid::Jid;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

// =============================================================================
// CLUSTER A: ADDRESSING
// =============================================================================

/// A validated XMPP address (`local@domain/resource`).
///
/// Parsing goes through the `jid` crate, so anything held in an `Address`
/// has already passed nodeprep/nameprep/resourceprep.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(Jid);

impl Address {
    /// Parse and normalise an address.
    pub fn parse(input: &str) -> Result<Self, ConfigurationError> {
        if input.trim().is_empty() {
            return Err(ConfigurationError::InvalidAddress {
                input: input.to_string(),
                reason: "address is empty".to_string(),
            });
        }

        input
            .parse::<Jid>()
            .map(Address)
            .map_err(|e| ConfigurationError::InvalidAddress {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    /// The underlying JID.
    pub fn as_jid(&self) -> &Jid {
        &self.0
    }

    /// The address without its resource part.
    pub fn bare(&self) -> Address {
        let text = self.to_string();
        match text.split_once('/') {
            Some((bare, _)) => bare.parse().map(Address).unwrap_or_else(|_| self.clone()),
            None => self.clone(),
        }
    }

    /// The resource part, if this is a full address.
    pub fn resource(&self) -> Option<String> {
        self.to_string()
            .split_once('/')
            .map(|(_, resource)| resource.to_string())
    }

    /// The domain part.
    pub fn domain(&self) -> String {
        let bare = self.bare().to_string();
        match bare.rsplit_once('@') {
            Some((_, domain)) => domain.to_string(),
            None => bare,
        }
    }

    /// Whether the address carries a resource.
    pub fn is_full(&self) -> bool {
        self.resource().is_some()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// The entity per-principal interceptors are registered against.
///
/// Always the bare form of an address, so every resource of a user shares
/// the same interceptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Address> for Principal {
    fn from(address: &Address) -> Self {
        Principal(address.bare().to_string())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER B: ORDERING
// =============================================================================

/// Identifies a logically ordered stream of stanzas, e.g. one room's
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamKey(String);

impl StreamKey {
    pub fn new(key: impl Into<String>) -> Self {
        StreamKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Address> for StreamKey {
    fn from(address: &Address) -> Self {
        StreamKey(address.bare().to_string())
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a stanza within its stream. Assigned once, at intake.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CLUSTER C: SESSIONS
// =============================================================================

/// Which way a stanza is travelling relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Read from a session.
    Incoming,
    /// About to be written to a session.
    Outgoing,
}

impl Direction {
    pub fn is_incoming(self) -> bool {
        matches!(self, Direction::Incoming)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the connection a stanza enters or leaves through.
///
/// Deliberately a plain value: anything that needs the live connection
/// must look it up by `address`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Full address bound to the connection.
    pub address: Address,
    /// The local domain serving the connection.
    pub server_domain: Address,
}

impl SessionInfo {
    pub fn new(address: Address, server_domain: Address) -> Self {
        Self {
            address,
            server_domain,
        }
    }

    /// Key for per-principal interceptor lookup.
    pub fn principal(&self) -> Principal {
        Principal::from(&self.address)
    }
}
