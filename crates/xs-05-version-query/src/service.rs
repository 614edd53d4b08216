//! # Version Query Manager
//!
//! Listens for `ResourceBound` on the shared bus and schedules one query per
//! binding.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shared_bus::{ServerEvent, Subscription};
use shared_types::{Address, Direction, SessionInfo};
use tracing::{debug, info, warn};
use xs_04_interceptors::{DispatchOutcome, StanzaPipeline};

use crate::config::VersionQueryConfig;
use crate::domain::{version_query, VersionQueryError};
use crate::ports::SessionDirectory;

pub struct VersionQueryManager {
    server_domain: Address,
    directory: Arc<dyn SessionDirectory>,
    pipeline: Arc<dyn StanzaPipeline>,
    enabled: AtomicBool,
    delay: Duration,
    sent: AtomicU64,
}

impl VersionQueryManager {
    pub fn new(
        server_domain: Address,
        directory: Arc<dyn SessionDirectory>,
        pipeline: Arc<dyn StanzaPipeline>,
        config: &VersionQueryConfig,
    ) -> Self {
        Self {
            server_domain,
            directory,
            pipeline,
            enabled: AtomicBool::new(config.enabled),
            delay: config.delay(),
            sent: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Takes effect for queries already scheduled too.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Queries that made it through the pipeline to a session.
    pub fn queries_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Schedule a query to `address` after the configured delay.
    pub fn schedule(self: &Arc<Self>, address: Address) -> Result<(), VersionQueryError> {
        if !self.is_enabled() {
            return Ok(());
        }
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| VersionQueryError::NoRuntime(e.to_string()))?;

        let manager = Arc::clone(self);
        let delay = self.delay;
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            match manager.query_now(&address) {
                Ok(true) => debug!(address = %address, "Version query sent"),
                Ok(false) => {}
                Err(e) => warn!(address = %address, error = %e, "Version query failed"),
            }
        });
        Ok(())
    }

    /// Send the query now if the session is still there.
    ///
    /// The query runs the outgoing pass for the re-resolved session. Returns
    /// whether it was delivered; a query withheld by an interceptor counts
    /// as not sent.
    pub fn query_now(&self, address: &Address) -> Result<bool, VersionQueryError> {
        if !self.is_enabled() {
            return Ok(false);
        }
        let Some(session) = self.directory.find(address) else {
            return Ok(false);
        };
        if session.is_closed() {
            return Ok(false);
        }

        let target = SessionInfo::new(session.address().clone(), self.server_domain.clone());
        let mut query = version_query(&self.server_domain, &target.address);
        match self.pipeline.dispatch(&mut query, &target, Direction::Outgoing)? {
            DispatchOutcome::Delivered => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            DispatchOutcome::RejectedWithReply(rejection) | DispatchOutcome::Dropped(rejection) => {
                debug!(address = %target.address, reason = %rejection, "Version query withheld");
                Ok(false)
            }
        }
    }

    /// Consume bus events until the bus goes away.
    pub async fn run(self: Arc<Self>, mut subscription: Subscription) {
        info!(delay_ms = self.delay.as_millis() as u64, "Version query manager running");
        while let Some(event) = subscription.recv().await {
            if let ServerEvent::ResourceBound { address } = event {
                if let Err(e) = self.schedule(address) {
                    warn!(error = %e, "Could not schedule version query");
                }
            }
        }
        debug!("Event bus closed, version query manager stopping");
    }
}
