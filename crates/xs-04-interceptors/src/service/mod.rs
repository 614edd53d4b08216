//! Service layer for the stanza pipeline.

pub mod dispatcher;

pub use dispatcher::PipelineDispatcher;
