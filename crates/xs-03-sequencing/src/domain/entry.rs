//! Archived form of a conversation stanza.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Address, SequenceNumber, SessionInfo, Stanza, StreamKey};

/// One line of a stream's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationLogEntry {
    /// Position assigned at intake.
    pub sequence: SequenceNumber,
    /// The stream the stanza belongs to.
    pub stream: StreamKey,
    /// Real address of the sender.
    pub sender: Address,
    /// Occupant nickname: the resource of the room-side address
    /// (`room@service/nick`). Absent when the stanza does not carry one,
    /// e.g. an occupant's own message to the bare room address.
    pub nickname: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    /// The stanza as delivered, extension elements included.
    pub stanza: Stanza,
    pub logged_at: DateTime<Utc>,
}

impl ConversationLogEntry {
    pub fn new(
        sequence: SequenceNumber,
        stream: StreamKey,
        stanza: &Stanza,
        session: &SessionInfo,
    ) -> Self {
        let occupant = stanza
            .from()
            .filter(|from| from.is_full() && StreamKey::from(*from) == stream);
        // A stanza from the room speaks with the occupant address; the real
        // sender is then the session it passes through.
        let sender = match (stanza.from(), occupant) {
            (Some(from), None) => from.clone(),
            _ => session.address.clone(),
        };
        Self {
            sequence,
            nickname: occupant.and_then(Address::resource),
            stream,
            sender,
            subject: stanza.subject().map(str::to_owned),
            body: stanza.body().map(str::to_owned),
            stanza: stanza.clone(),
            logged_at: Utc::now(),
        }
    }
}
