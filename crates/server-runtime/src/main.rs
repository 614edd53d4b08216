//! # Stanza Relay
//!
//! Entry point. Loads configuration, initializes telemetry, runs until
//! Ctrl+C.

use anyhow::{Context, Result};
use tracing::info;

use server_runtime::{ServerConfig, ServerRuntime};
use xs_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = ServerConfig::load().context("Failed to load configuration")?;

    let runtime = ServerRuntime::new(config).context("Failed to build server")?;
    runtime.start().await.context("Failed to start server")?;

    info!("Server is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown().await;

    Ok(())
}
