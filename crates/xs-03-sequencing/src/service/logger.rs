//! # Conversation Logger
//!
//! Decouples persistence from the pipeline. `enqueue` never blocks; a
//! background task collects entries and writes them in batches, either when
//! a batch is full or when the flush interval elapses.
//!
//! A batch the store refuses is logged and dropped. Its numbers stay used.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::domain::{ConversationLogEntry, ConversationLogError};
use crate::ports::ConversationStore;

/// Counters kept by the logger.
#[derive(Debug, Default)]
pub struct LoggerStats {
    queued: AtomicU64,
    flushed: AtomicU64,
    batches: AtomicU64,
    dropped: AtomicU64,
}

impl LoggerStats {
    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }

    /// Entries the store accepted.
    pub fn flushed(&self) -> u64 {
        self.flushed.load(Ordering::Relaxed)
    }

    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Entries lost to store failures.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Batching writer in front of a `ConversationStore`.
pub struct ConversationLogger {
    sender: Mutex<Option<mpsc::UnboundedSender<ConversationLogEntry>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<LoggerStats>,
}

impl ConversationLogger {
    /// Spawn the flush task on the current Tokio runtime.
    pub fn start(
        store: Arc<dyn ConversationStore>,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Result<Self, ConversationLogError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| ConversationLogError::NoRuntime(e.to_string()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(LoggerStats::default());
        let task = handle.spawn(run_flusher(
            receiver,
            store,
            batch_size.max(1),
            flush_interval.max(Duration::from_millis(1)),
            stats.clone(),
        ));

        info!(batch_size, flush_ms = flush_interval.as_millis() as u64, "Conversation logger started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            task: Mutex::new(Some(task)),
            stats,
        })
    }

    /// Queue an entry for persistence.
    pub fn enqueue(&self, entry: ConversationLogEntry) -> Result<(), ConversationLogError> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(ConversationLogError::Closed)?;
        sender
            .send(entry)
            .map_err(|_| ConversationLogError::Closed)?;
        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> &LoggerStats {
        &self.stats
    }

    /// Stop accepting entries, flush what is queued, and wait for the task.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
            info!(
                flushed = self.stats.flushed(),
                dropped = self.stats.dropped(),
                "Conversation logger stopped"
            );
        }
    }
}

async fn run_flusher(
    mut receiver: mpsc::UnboundedReceiver<ConversationLogEntry>,
    store: Arc<dyn ConversationStore>,
    batch_size: usize,
    flush_interval: Duration,
    stats: Arc<LoggerStats>,
) {
    let mut batch = Vec::with_capacity(batch_size);
    let mut ticker = interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Some(entry) => {
                    batch.push(entry);
                    if batch.len() >= batch_size {
                        flush(store.as_ref(), &mut batch, &stats).await;
                    }
                }
                None => {
                    flush(store.as_ref(), &mut batch, &stats).await;
                    break;
                }
            },
            _ = ticker.tick() => {
                flush(store.as_ref(), &mut batch, &stats).await;
            }
        }
    }
}

async fn flush(
    store: &dyn ConversationStore,
    batch: &mut Vec<ConversationLogEntry>,
    stats: &LoggerStats,
) {
    if batch.is_empty() {
        return;
    }
    let entries = std::mem::take(batch);
    let count = entries.len() as u64;
    let first = entries.first().map(|e| e.sequence.value()).unwrap_or(0);

    match store.append_batch(entries).await {
        Ok(()) => {
            stats.flushed.fetch_add(count, Ordering::Relaxed);
            stats.batches.fetch_add(1, Ordering::Relaxed);
            debug!(count, first_sequence = first, "Conversation batch flushed");
        }
        Err(e) => {
            stats.dropped.fetch_add(count, Ordering::Relaxed);
            error!(count, first_sequence = first, error = %e, "Conversation batch lost");
        }
    }
}
