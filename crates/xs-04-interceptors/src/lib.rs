//! # XS-04 Interceptors
//!
//! The stanza pipeline: every stanza entering or leaving the server passes
//! through here on its way to the router or the wire.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `InterceptorRegistry`: global and per-principal interceptor lists
//!   - `InterceptorChain`: the immutable snapshot one dispatch iterates
//!   - `DispatchOutcome`, `DispatchStats`
//! - **Ports Layer** (`ports/`)
//!   - `StanzaPipeline` (inbound)
//!   - `StanzaRouter`, `StanzaTransport` (outbound)
//! - **Service Layer** (`service/`)
//!   - `PipelineDispatcher`: runs the chain around delivery
//!
//! ## Call order for one stanza
//!
//! ```text
//! pre:  global[0..] -> principal[0..] -> built-ins[0..]
//! deliver: incoming -> router, outgoing -> transport
//! post: global[0..] -> principal[0..] -> built-ins[0..]
//! ```
//!
//! A rejection in `pre` stops everything. An incoming stanza is answered
//! with one error reply; an outgoing one is dropped silently. Rejections in
//! `post` are logged and the remaining post calls still run.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    DispatchOutcome, DispatchStats, DispatchStatsSnapshot, InterceptorChain, InterceptorRegistry,
    RegistryError,
};
pub use ports::{StanzaPipeline, StanzaRouter, StanzaTransport};
pub use service::PipelineDispatcher;
