//! # XS-02 Stanza ID
//!
//! Attaches unique and stable identifiers to stanzas so that clients and
//! archives can refer to them later.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `StampingSettings`: the runtime toggles, read on every stamp
//!   - `StanzaIdStamper`: removes our previous element and attaches a fresh one
//!   - `find_stable_id`: looks an identifier up again
//! - **Interceptor** (`interceptor.rs`): runs the stamper on incoming stanzas
//!   in the pre-processing phase
//! - **Config** (`config.rs`): serde-friendly defaults
//!
//! ## Invariants
//!
//! - After stamping, exactly one element carries `by = self`.
//! - Elements contributed by other entities are left untouched.
//! - An IQ is stamped on its payload child; an IQ without one is left alone.
//!
//! ```ignore
//! let settings = Arc::new(StampingSettings::default());
//! let stamper = StanzaIdStamper::new("chat.example.com", settings)?;
//! let outcome = stamper.stamp(&mut stanza);
//! assert_eq!(find_stable_id(&stanza, stamper.by()), outcome.id().map(String::from));
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;
pub mod interceptor;

pub use config::StampingConfig;
pub use domain::{
    find_stable_id, StampOutcome, StampingError, StampingSettings, StanzaIdStamper, NS_SID,
    STANZA_ID,
};
pub use interceptor::StanzaIdInterceptor;
