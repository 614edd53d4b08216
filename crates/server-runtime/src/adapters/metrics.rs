//! # Prometheus Reporter
//!
//! Implements the traffic monitor's `TrafficReporter` port. Each sample sets
//! the traffic gauges and copies the subsystems' own counters into the
//! Prometheus collectors, so the whole server is exported once per sampling
//! interval.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use xs_01_traffic_accounting::{TrafficReporter, TrafficSample};
use xs_02_stanza_id::StanzaIdStamper;
use xs_03_sequencing::{ConversationLogger, SequencingInterceptor};
use xs_04_interceptors::PipelineDispatcher;
use xs_05_version_query::VersionQueryManager;
use xs_telemetry::{metrics, Counter};

/// Counter values already pushed to Prometheus.
#[derive(Debug, Default, Clone, Copy)]
struct Exported {
    incoming: u64,
    outgoing: u64,
    incoming_rejected: u64,
    outgoing_rejected: u64,
    post_faults: u64,
    delivery_failures: u64,
    stamped: u64,
    sequenced: u64,
    log_batches: u64,
    log_dropped: u64,
    version_queries: u64,
}

/// Pushes traffic samples and subsystem counters to Prometheus.
pub struct PrometheusReporter {
    dispatcher: Arc<PipelineDispatcher>,
    stamper: Arc<StanzaIdStamper>,
    sequencing: Arc<SequencingInterceptor>,
    logger: Arc<ConversationLogger>,
    version_query: Arc<VersionQueryManager>,
    exported: Mutex<Exported>,
}

impl PrometheusReporter {
    pub fn new(
        dispatcher: Arc<PipelineDispatcher>,
        stamper: Arc<StanzaIdStamper>,
        sequencing: Arc<SequencingInterceptor>,
        logger: Arc<ConversationLogger>,
        version_query: Arc<VersionQueryManager>,
    ) -> Self {
        Self {
            dispatcher,
            stamper,
            sequencing,
            logger,
            version_query,
            exported: Mutex::new(Exported::default()),
        }
    }

    /// Copy the subsystem counters into Prometheus.
    pub fn export_counters(&self) {
        let stats = self.dispatcher.stats().snapshot();
        let log = self.logger.stats();
        let current = Exported {
            incoming: stats.incoming,
            outgoing: stats.outgoing,
            incoming_rejected: stats.incoming_rejected,
            outgoing_rejected: stats.outgoing_rejected,
            post_faults: stats.post_faults,
            delivery_failures: stats.delivery_failures,
            stamped: self.stamper.stamped_total(),
            sequenced: self.sequencing.assigned_total(),
            log_batches: log.batches(),
            log_dropped: log.dropped(),
            version_queries: self.version_query.queries_sent(),
        };

        let mut exported = self.exported.lock();
        let previous = *exported;

        add(
            &metrics::STANZAS_DISPATCHED.with_label_values(&["incoming"]),
            current.incoming,
            previous.incoming,
        );
        add(
            &metrics::STANZAS_DISPATCHED.with_label_values(&["outgoing"]),
            current.outgoing,
            previous.outgoing,
        );
        add(
            &metrics::STANZAS_REJECTED.with_label_values(&["incoming"]),
            current.incoming_rejected,
            previous.incoming_rejected,
        );
        add(
            &metrics::STANZAS_REJECTED.with_label_values(&["outgoing"]),
            current.outgoing_rejected,
            previous.outgoing_rejected,
        );
        add(&metrics::POST_PROCESSING_FAULTS, current.post_faults, previous.post_faults);
        add(
            &metrics::DELIVERY_FAILURES,
            current.delivery_failures,
            previous.delivery_failures,
        );
        add(&metrics::STANZA_IDS_STAMPED, current.stamped, previous.stamped);
        add(&metrics::SEQUENCES_ASSIGNED, current.sequenced, previous.sequenced);
        add(
            &metrics::CONVERSATION_BATCHES_FLUSHED,
            current.log_batches,
            previous.log_batches,
        );
        add(
            &metrics::CONVERSATION_ENTRIES_LOST,
            current.log_dropped,
            previous.log_dropped,
        );
        add(
            &metrics::VERSION_QUERIES_SENT,
            current.version_queries,
            previous.version_queries,
        );

        *exported = current;
    }
}

fn add(counter: &Counter, current: u64, previous: u64) {
    let delta = current.saturating_sub(previous);
    if delta > 0 {
        counter.inc_by(delta as f64);
    }
}

impl TrafficReporter for PrometheusReporter {
    fn report(&self, sample: &TrafficSample) {
        metrics::TRAFFIC_INCOMING_KB.set(sample.incoming_kb());
        metrics::TRAFFIC_OUTGOING_KB.set(sample.outgoing_kb());
        self.export_counters();

        debug!(
            incoming_kb = sample.incoming_kb(),
            outgoing_kb = sample.outgoing_kb(),
            "Traffic sample exported"
        );
    }
}
