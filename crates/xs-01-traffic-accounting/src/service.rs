//! # Traffic Monitor
//!
//! Owns the periodic sampler. `start` spawns a task that drains the shared
//! counter every interval and hands the sample to a `TrafficReporter`;
//! `stop` ends it. `sample` drains on demand for callers that poll instead.
//!
//! Both paths share one drain mark, so every sample covers exactly the time
//! since the previous drain, whichever path took it.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::TrafficConfig;
use crate::domain::{MonitorError, TrafficCounter, TrafficSample};
use crate::ports::TrafficReporter;

struct Running {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Drains `counter` into a sample covering the time since `drained_at`.
fn drain_window(counter: &TrafficCounter, drained_at: &Mutex<Instant>) -> TrafficSample {
    let mut since = drained_at.lock();
    let now = Instant::now();
    let sample = counter.sample(now.saturating_duration_since(*since));
    *since = now;
    sample
}

/// Periodic sampler over a shared `TrafficCounter`.
pub struct TrafficMonitor {
    counter: Arc<TrafficCounter>,
    config: TrafficConfig,
    drained_at: Arc<Mutex<Instant>>,
    last: Arc<RwLock<Option<TrafficSample>>>,
    running: Mutex<Option<Running>>,
}

impl TrafficMonitor {
    pub fn new(counter: Arc<TrafficCounter>, config: TrafficConfig) -> Self {
        Self {
            counter,
            config,
            drained_at: Arc::new(Mutex::new(Instant::now())),
            last: Arc::new(RwLock::new(None)),
            running: Mutex::new(None),
        }
    }

    /// The counter the wrapped streams should feed.
    pub fn counter(&self) -> Arc<TrafficCounter> {
        self.counter.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Start the sampling task on the current Tokio runtime.
    pub fn start(&self, reporter: Arc<dyn TrafficReporter>) -> Result<(), MonitorError> {
        let period = self.config.sample_interval();
        if period.is_zero() {
            return Err(MonitorError::ZeroInterval);
        }

        let mut running = self.running.lock();
        if running.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| MonitorError::NoRuntime(e.to_string()))?;

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let counter = self.counter.clone();
        let drained_at = self.drained_at.clone();
        let last = self.last.clone();

        let task = handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let sample = drain_window(&counter, &drained_at);
                        debug!(
                            incoming_bytes = sample.incoming_bytes,
                            outgoing_bytes = sample.outgoing_bytes,
                            window_ms = sample.interval.as_millis() as u64,
                            "Traffic sampled"
                        );
                        reporter.report(&sample);
                        *last.write() = Some(sample);
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        info!(interval_secs = period.as_secs(), "Traffic monitor started");
        *running = Some(Running { shutdown, task });
        Ok(())
    }

    /// Drain the counter now and return the window since the last drain.
    ///
    /// The window's length is the time actually elapsed, so a partial
    /// window (say, at shutdown) reports a true rate.
    pub fn sample(&self) -> TrafficSample {
        let sample = drain_window(&self.counter, &self.drained_at);
        *self.last.write() = Some(sample);
        sample
    }

    /// The most recent sample taken by either path.
    pub fn last_sample(&self) -> Option<TrafficSample> {
        *self.last.read()
    }

    /// Stop the sampling task and wait for it to finish. No-op when stopped.
    pub async fn stop(&self) {
        let running = self.running.lock().take();
        if let Some(Running { shutdown, task }) = running {
            let _ = shutdown.send(true);
            let _ = task.await;
            info!("Traffic monitor stopped");
        }
    }
}
