//! # Stanza Relay Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-subsystem flows
//!     ├── pipeline_flows.rs    # registry + dispatcher + stanza id
//!     ├── sequencing_flows.rs  # assigners + conversation log
//!     └── server_e2e.rs        # full runtime over in-memory sessions
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p xs-tests
//! cargo test -p xs-tests integration::pipeline_flows
//!
//! # Benchmarks
//! cargo bench -p xs-tests
//! ```

#![allow(dead_code)]

pub mod integration;
