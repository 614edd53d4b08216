//! # Server Runtime
//!
//! Owns the container and the background tasks.
//!
//! ## Startup Sequence
//!
//! 1. Build the container (validates configuration)
//! 2. Start the traffic monitor with the Prometheus reporter
//! 3. Subscribe the version query manager to resource binding events
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown to the event handlers
//! 2. Stop the traffic monitor and export a final sample
//! 3. Flush the conversation log

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use shared_bus::{EventFilter, EventTopic};
use shared_types::{Direction, SessionInfo, Stanza};
use xs_01_traffic_accounting::{CountingReader, TrafficReporter};
use xs_04_interceptors::{DispatchOutcome, StanzaPipeline};

use crate::container::{ServerConfig, ServerContainer};
use crate::errors::{IngestError, RuntimeError};

/// Time allowed for event handlers to finish after the shutdown signal.
const HANDLER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// The stanza relay server.
pub struct ServerRuntime {
    container: Arc<ServerContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handlers: Mutex<Vec<JoinHandle<()>>>,
}

impl ServerRuntime {
    /// Build the server. Must run inside a Tokio runtime.
    pub fn new(config: ServerConfig) -> Result<Self, RuntimeError> {
        info!(domain = %config.domain, "Creating stanza relay runtime");
        let container = Arc::new(ServerContainer::new(config)?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            handlers: Mutex::new(Vec::new()),
        })
    }

    /// Start the background services.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        info!("===========================================");
        info!("  Stanza Relay v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        self.container
            .traffic_monitor
            .start(self.container.reporter.clone())?;

        let subscription = self
            .container
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::ResourceBinding]));
        let manager = self.container.version_query.clone();
        let mut shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = manager.run(subscription) => {}
                _ = shutdown.changed() => {
                    info!("[xs-05] Shutdown signal received");
                }
            }
        });
        self.handlers.lock().push(handle);

        info!(domain = %self.container.domain, "All subsystems running");
        Ok(())
    }

    /// Take one stanza off a session's wire and run it through the pipeline.
    ///
    /// `wire` holds one JSON-encoded stanza; its bytes count as incoming
    /// traffic whether or not it decodes.
    pub fn receive(
        &self,
        session: &SessionInfo,
        wire: &[u8],
    ) -> Result<DispatchOutcome, IngestError> {
        let reader = CountingReader::new(wire, self.container.traffic_counter.clone());
        let mut stanza: Stanza = serde_json::from_reader(reader)?;
        Ok(self
            .container
            .dispatcher
            .dispatch(&mut stanza, session, Direction::Incoming)?)
    }

    /// Send a server-side stanza out through a session.
    pub fn send(
        &self,
        mut stanza: Stanza,
        session: &SessionInfo,
    ) -> Result<DispatchOutcome, IngestError> {
        Ok(self
            .container
            .dispatcher
            .dispatch(&mut stanza, session, Direction::Outgoing)?)
    }

    /// Shut the server down gracefully.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let handlers: Vec<_> = self.handlers.lock().drain(..).collect();
        for handle in handlers {
            if tokio::time::timeout(HANDLER_DRAIN_TIMEOUT, handle).await.is_err() {
                warn!("Event handler did not stop in time");
            }
        }

        self.container.traffic_monitor.stop().await;
        let last = self.container.traffic_monitor.sample();
        self.container.reporter.report(&last);

        self.container.conversation_logger.shutdown().await;

        info!("Shutdown complete");
    }

    pub fn container(&self) -> Arc<ServerContainer> {
        Arc::clone(&self.container)
    }
}
