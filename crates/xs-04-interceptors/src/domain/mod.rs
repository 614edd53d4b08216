//! Domain layer for the stanza pipeline.

pub mod errors;
pub mod outcome;
pub mod registry;

pub use errors::RegistryError;
pub use outcome::{DispatchOutcome, DispatchStats, DispatchStatsSnapshot};
pub use registry::{InterceptorChain, InterceptorRegistry};
