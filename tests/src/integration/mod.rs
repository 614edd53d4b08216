//! Cross-subsystem integration tests.

pub mod pipeline_flows;
pub mod sequencing_flows;
pub mod server_e2e;
