//! Prometheus metrics for the stanza relay.
//!
//! All metrics follow the naming convention: `xs_<subsystem>_<metric>_<unit>`
//!
//! Subsystems keep their own atomic counters; the runtime copies them into
//! these collectors on every traffic sample.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // TRAFFIC ACCOUNTING (Subsystem 1)
    // =========================================================================

    /// Kilobytes received during the last sampling interval
    pub static ref TRAFFIC_INCOMING_KB: Gauge = Gauge::new(
        "xs_traffic_incoming_kilobytes",
        "Kilobytes received from clients in the last sampling interval"
    ).expect("metric creation failed");

    /// Kilobytes sent during the last sampling interval
    pub static ref TRAFFIC_OUTGOING_KB: Gauge = Gauge::new(
        "xs_traffic_outgoing_kilobytes",
        "Kilobytes sent to clients in the last sampling interval"
    ).expect("metric creation failed");

    // =========================================================================
    // STANZA ID (Subsystem 2)
    // =========================================================================

    /// Stanza-id elements written by this server
    pub static ref STANZA_IDS_STAMPED: Counter = Counter::new(
        "xs_stanza_id_stamped_total",
        "Total number of stanza-id elements added to incoming stanzas"
    ).expect("metric creation failed");

    // =========================================================================
    // SEQUENCING (Subsystem 3)
    // =========================================================================

    /// Sequence numbers handed out
    pub static ref SEQUENCES_ASSIGNED: Counter = Counter::new(
        "xs_sequencing_assigned_total",
        "Total number of sequence numbers assigned to group chat messages"
    ).expect("metric creation failed");

    /// Conversation log batches written
    pub static ref CONVERSATION_BATCHES_FLUSHED: Counter = Counter::new(
        "xs_sequencing_log_batches_total",
        "Total number of conversation log batches written to the store"
    ).expect("metric creation failed");

    /// Conversation log entries that never reached the store
    pub static ref CONVERSATION_ENTRIES_LOST: Counter = Counter::new(
        "xs_sequencing_log_entries_lost_total",
        "Total number of conversation log entries dropped after a failed write"
    ).expect("metric creation failed");

    // =========================================================================
    // INTERCEPTOR PIPELINE (Subsystem 4)
    // =========================================================================

    /// Stanzas dispatched through the pipeline
    pub static ref STANZAS_DISPATCHED: CounterVec = CounterVec::new(
        Opts::new("xs_pipeline_stanzas_total", "Total stanzas dispatched through the pipeline"),
        &["direction"]  // incoming / outgoing
    ).expect("metric creation failed");

    /// Stanzas rejected by a pre-processing interceptor
    pub static ref STANZAS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("xs_pipeline_rejected_total", "Total stanzas rejected before processing"),
        &["direction"]
    ).expect("metric creation failed");

    /// Rejections returned after processing, which are ignored
    pub static ref POST_PROCESSING_FAULTS: Counter = Counter::new(
        "xs_pipeline_post_faults_total",
        "Total rejections returned by interceptors after processing"
    ).expect("metric creation failed");

    /// Stanzas the router or transport failed to deliver
    pub static ref DELIVERY_FAILURES: Counter = Counter::new(
        "xs_pipeline_delivery_failures_total",
        "Total stanzas that failed routing or delivery"
    ).expect("metric creation failed");

    // =========================================================================
    // VERSION QUERY (Subsystem 5)
    // =========================================================================

    /// Software version queries sent to newly bound sessions
    pub static ref VERSION_QUERIES_SENT: Counter = Counter::new(
        "xs_version_queries_sent_total",
        "Total software version queries sent to clients"
    ).expect("metric creation failed");
}

/// Register every collector with [`REGISTRY`].
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Traffic
        Box::new(TRAFFIC_INCOMING_KB.clone()),
        Box::new(TRAFFIC_OUTGOING_KB.clone()),
        // Stanza id
        Box::new(STANZA_IDS_STAMPED.clone()),
        // Sequencing
        Box::new(SEQUENCES_ASSIGNED.clone()),
        Box::new(CONVERSATION_BATCHES_FLUSHED.clone()),
        Box::new(CONVERSATION_ENTRIES_LOST.clone()),
        // Pipeline
        Box::new(STANZAS_DISPATCHED.clone()),
        Box::new(STANZAS_REJECTED.clone()),
        Box::new(POST_PROCESSING_FAULTS.clone()),
        Box::new(DELIVERY_FAILURES.clone()),
        // Version query
        Box::new(VERSION_QUERIES_SENT.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
