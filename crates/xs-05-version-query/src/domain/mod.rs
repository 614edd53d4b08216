//! Domain layer for the version query.

pub mod errors;
pub mod query;

pub use errors::VersionQueryError;
pub use query::{version_query, NS_VERSION};
