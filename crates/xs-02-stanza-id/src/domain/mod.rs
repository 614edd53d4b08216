//! Domain layer for stanza identifiers.

pub mod errors;
pub mod settings;
pub mod stamping;

pub use errors::StampingError;
pub use settings::StampingSettings;
pub use stamping::{find_stable_id, StampOutcome, StanzaIdStamper, NS_SID, STANZA_ID};
