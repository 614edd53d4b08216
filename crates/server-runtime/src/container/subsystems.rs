//! # Server Container
//!
//! Holds all subsystem instances and wires them into the interceptor
//! pipeline.
//!
//! ## Initialization Order
//!
//! ```text
//! Shared:   event bus, traffic counter, sessions
//! Level 1:  stanza id stamper, sequencing (assigner, resolver, logger)
//! Level 2:  interceptor registry, pipeline dispatcher with built-ins
//! Level 3:  traffic monitor, version query manager, metrics reporter
//! ```
//!
//! Built-in interceptors run after the registry chain, stanza id first.
//! Sessions hold a weak handle to the dispatcher so routed stanzas run the
//! outgoing pass for each recipient.

use std::sync::Arc;

use tracing::{info, instrument};

use shared_bus::InMemoryEventBus;
use shared_types::Address;
use xs_01_traffic_accounting::{TrafficCounter, TrafficMonitor};
use xs_02_stanza_id::{StanzaIdInterceptor, StanzaIdStamper};
use xs_03_sequencing::{
    BlockSequenceAssigner, ConversationLogger, GroupChatStreamResolver, InMemoryBlockSource,
    InMemoryConversationStore, LocalSequenceAssigner, SequenceAssigner, SequencingInterceptor,
};
use xs_04_interceptors::{InterceptorRegistry, PipelineDispatcher, StanzaPipeline};
use xs_05_version_query::VersionQueryManager;

use crate::adapters::{InMemorySessionRegistry, PrometheusReporter};
use crate::container::config::ServerConfig;
use crate::errors::RuntimeError;

/// Central container holding all subsystem instances.
pub struct ServerContainer {
    // =========================================================================
    // TRAFFIC ACCOUNTING (Subsystem 1)
    // =========================================================================
    pub traffic_counter: Arc<TrafficCounter>,
    pub traffic_monitor: TrafficMonitor,

    // =========================================================================
    // STANZA ID (Subsystem 2)
    // =========================================================================
    pub stamper: Arc<StanzaIdStamper>,

    // =========================================================================
    // SEQUENCING (Subsystem 3)
    // =========================================================================
    pub sequencing: Arc<SequencingInterceptor>,
    pub conversation_store: Arc<InMemoryConversationStore>,
    pub conversation_logger: Arc<ConversationLogger>,

    // =========================================================================
    // INTERCEPTOR PIPELINE (Subsystem 4)
    // =========================================================================
    pub registry: Arc<InterceptorRegistry>,
    pub dispatcher: Arc<PipelineDispatcher>,

    // =========================================================================
    // VERSION QUERY (Subsystem 5)
    // =========================================================================
    pub version_query: Arc<VersionQueryManager>,

    // =========================================================================
    // SHARED INFRASTRUCTURE
    // =========================================================================
    pub event_bus: Arc<InMemoryEventBus>,
    pub sessions: Arc<InMemorySessionRegistry>,
    pub reporter: Arc<PrometheusReporter>,
    pub domain: Address,
    pub config: ServerConfig,
}

impl ServerContainer {
    /// Build every subsystem.
    ///
    /// Must be called from inside a Tokio runtime: the conversation logger
    /// spawns its flush task here.
    #[instrument(name = "container_init", skip(config), fields(domain = %config.domain))]
    pub fn new(config: ServerConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let domain = config.domain_address()?;
        let group_chat = config.group_chat_address()?;

        // =====================================================================
        // SHARED INFRASTRUCTURE
        // =====================================================================
        let event_bus = Arc::new(InMemoryEventBus::new());
        let traffic_counter = Arc::new(TrafficCounter::new());
        let sessions = Arc::new(InMemorySessionRegistry::new(
            traffic_counter.clone(),
            event_bus.clone(),
        ));

        // =====================================================================
        // LEVEL 1: Stanza id and sequencing
        // =====================================================================
        let stamper = Arc::new(StanzaIdStamper::with_address(
            domain.clone(),
            Arc::new(config.stamping.to_settings()),
        ));
        info!(by = %domain, "  [2] Stanza id stamper initialized");

        let assigner: Arc<dyn SequenceAssigner> = if config.sequencing.is_clustered() {
            Arc::new(BlockSequenceAssigner::new(
                Arc::new(InMemoryBlockSource::new()),
                config.sequencing.node_id,
                config.sequencing.block_size,
            )?)
        } else {
            Arc::new(LocalSequenceAssigner::new())
        };

        let conversation_store = Arc::new(InMemoryConversationStore::new());
        let conversation_logger = Arc::new(ConversationLogger::start(
            conversation_store.clone(),
            config.sequencing.log_batch_size,
            config.sequencing.flush_interval(),
        )?);
        let sequencing = Arc::new(
            SequencingInterceptor::new(
                assigner,
                Arc::new(GroupChatStreamResolver::new(group_chat.to_string())),
            )
            .with_logger(conversation_logger.clone()),
        );
        info!(
            service = %group_chat,
            clustered = config.sequencing.is_clustered(),
            "  [3] Sequencing initialized"
        );

        // =====================================================================
        // LEVEL 2: Pipeline
        // =====================================================================
        let registry = Arc::new(InterceptorRegistry::new());
        let dispatcher = Arc::new(
            PipelineDispatcher::new(registry.clone(), sessions.clone(), sessions.clone())
                .with_builtin(Arc::new(StanzaIdInterceptor::new(stamper.clone())))
                .with_builtin(sequencing.clone()),
        );
        let pipeline: Arc<dyn StanzaPipeline> = dispatcher.clone();
        sessions.attach_pipeline(&pipeline);
        info!("  [4] Interceptor pipeline initialized");

        // =====================================================================
        // LEVEL 3: Background services
        // =====================================================================
        let traffic_monitor = TrafficMonitor::new(traffic_counter.clone(), config.traffic.clone());
        info!(
            interval_secs = config.traffic.sample_interval_secs,
            "  [1] Traffic monitor initialized"
        );

        let version_query = Arc::new(VersionQueryManager::new(
            domain.clone(),
            sessions.clone(),
            pipeline,
            &config.version_query,
        ));
        info!(
            enabled = config.version_query.enabled,
            delay_ms = config.version_query.delay_ms,
            "  [5] Version query initialized"
        );

        let reporter = Arc::new(PrometheusReporter::new(
            dispatcher.clone(),
            stamper.clone(),
            sequencing.clone(),
            conversation_logger.clone(),
            version_query.clone(),
        ));

        info!("All subsystems initialized successfully");

        Ok(Self {
            traffic_counter,
            traffic_monitor,
            stamper,
            sequencing,
            conversation_store,
            conversation_logger,
            registry,
            dispatcher,
            version_query,
            event_bus,
            sessions,
            reporter,
            domain,
            config,
        })
    }
}
