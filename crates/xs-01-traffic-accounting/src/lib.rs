//! # XS-01 Traffic Accounting
//!
//! Counts the bytes that cross the server's network boundary.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `TrafficCounter` and `TrafficSample`
//! - **Adapters Layer** (`adapters/`): counting decorators over `std::io`
//!   and `tokio::io` byte streams
//! - **Ports Layer** (`ports/`): `TrafficReporter`, where samples go
//! - **Service Layer** (`service.rs`): `TrafficMonitor`, the periodic sampler
//!
//! ## Counting rules
//!
//! - Only successful transfers of more than zero bytes are counted.
//! - Errors from the wrapped stream are returned unchanged.
//! - Sampling drains the counters atomically; an increment racing a drain
//!   lands in exactly one window.
//!
//! ```ignore
//! let counter = Arc::new(TrafficCounter::new());
//! let mut socket = CountingStream::new(tcp, counter.clone());
//! socket.write_all(b"<presence/>").await?;
//! assert_eq!(counter.sample(Duration::from_secs(60)).outgoing_bytes, 11);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{CountingReader, CountingStream, CountingWriter};
pub use config::TrafficConfig;
pub use domain::{MonitorError, TrafficCounter, TrafficSample};
pub use ports::TrafficReporter;
pub use service::TrafficMonitor;
