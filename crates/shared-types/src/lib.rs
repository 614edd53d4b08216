//! # Shared Types Crate
//!
//! This crate contains the stanza model, addressing, and the interceptor
//! contract shared by every subsystem of the server.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every type that crosses a subsystem
//!   boundary is defined here.
//! - **Values, not handles**: `SessionInfo` identifies a connection by
//!   address; nothing here pins a live connection.
//! - **Explicit rejection**: Interceptors return `InterceptResult` instead
//!   of unwinding.

pub mod element;
pub mod entities;
pub mod errors;
pub mod interceptor;
pub mod stanza;

pub use element::Element;
pub use entities::*;
pub use errors::*;
pub use interceptor::*;
pub use stanza::*;
