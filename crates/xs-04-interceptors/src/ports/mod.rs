//! Ports for the stanza pipeline.

pub mod inbound;
pub mod outbound;

pub use inbound::StanzaPipeline;
pub use outbound::{StanzaRouter, StanzaTransport};
