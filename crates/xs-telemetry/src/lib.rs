//! # XS Telemetry
//!
//! Structured logging and Prometheus metrics for the server.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xs_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XS_SERVICE_NAME` | `stanza-relay` | Service name in logs |
//! | `XS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `XS_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `XS_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, CONVERSATION_BATCHES_FLUSHED, CONVERSATION_ENTRIES_LOST,
    DELIVERY_FAILURES, POST_PROCESSING_FAULTS, SEQUENCES_ASSIGNED, STANZAS_DISPATCHED,
    STANZAS_REJECTED, STANZA_IDS_STAMPED, TRAFFIC_INCOMING_KB, TRAFFIC_OUTGOING_KB,
    VERSION_QUERIES_SENT,
};
pub use prometheus::{Counter, CounterVec, Gauge};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register all metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
