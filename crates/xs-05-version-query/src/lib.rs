//! # XS-05 Version Query
//!
//! Asks freshly bound clients which software they run (XEP-0092).
//!
//! The query is sent a few seconds after resource binding, so that the
//! client has finished its own start-up traffic. Only the bound address is
//! remembered in the meantime. When the timer fires the session is looked
//! up again; if it has gone away nothing is sent. The query leaves through
//! the outgoing pass of the stanza pipeline, so outgoing interceptors may
//! withhold it.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): the query stanza and errors
//! - **Ports Layer** (`ports/`): `SessionDirectory` and `LiveSession`
//! - **Service Layer** (`service.rs`): `VersionQueryManager`, driven by
//!   `ResourceBound` events from the shared bus

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::VersionQueryConfig;
pub use domain::{version_query, VersionQueryError, NS_VERSION};
pub use ports::{LiveSession, SessionDirectory};
pub use service::VersionQueryManager;
