//! # In-Memory Sessions
//!
//! Connected sessions held in process. One registry plays three roles:
//!
//! - `SessionDirectory` for deferred work that must re-resolve a session
//! - `StanzaRouter` for incoming stanzas addressed to local users
//! - `StanzaTransport` for stanzas written to a session's wire
//!
//! A routed stanza leaves through each recipient's session, so every copy
//! runs the outgoing pass of the pipeline with the recipient as the session
//! before it reaches the wire:
//!
//! ```text
//! route -> pipeline(outgoing, recipient): pre -> send -> post
//! ```
//!
//! Each session's wire is a JSON-lines buffer behind a `CountingWriter`, so
//! every delivered byte shows up in the traffic counter.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace};

use shared_bus::{EventPublisher, InMemoryEventBus, ServerEvent};
use shared_types::{Address, DeliveryError, Direction, SessionInfo, Stanza};
use xs_01_traffic_accounting::{CountingWriter, TrafficCounter};
use xs_04_interceptors::{DispatchOutcome, StanzaPipeline, StanzaRouter, StanzaTransport};
use xs_05_version_query::{LiveSession, SessionDirectory};

/// One connected client.
pub struct MemorySession {
    address: Address,
    closed: AtomicBool,
    wire: Mutex<CountingWriter<Vec<u8>>>,
}

impl MemorySession {
    fn new(address: Address, counter: Arc<TrafficCounter>) -> Self {
        Self {
            address,
            closed: AtomicBool::new(false),
            wire: Mutex::new(CountingWriter::new(Vec::new(), counter)),
        }
    }

    /// Everything written to this session so far, one stanza per element.
    pub fn delivered(&self) -> Vec<Stanza> {
        let wire = self.wire.lock();
        wire.get_ref()
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .filter_map(|line| serde_json::from_slice(line).ok())
            .collect()
    }

    /// Write a stanza straight to the wire.
    pub fn deliver(&self, stanza: Stanza) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::SessionClosed(self.address.to_string()));
        }
        let mut line =
            serde_json::to_vec(&stanza).map_err(|e| DeliveryError::Transport(e.to_string()))?;
        line.push(b'\n');
        self.wire.lock().write_all(&line)?;
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl LiveSession for MemorySession {
    fn address(&self) -> &Address {
        &self.address
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// All live sessions, keyed by full address.
pub struct InMemorySessionRegistry {
    sessions: RwLock<HashMap<Address, Arc<MemorySession>>>,
    counter: Arc<TrafficCounter>,
    bus: Arc<InMemoryEventBus>,
    pipeline: RwLock<Option<Weak<dyn StanzaPipeline>>>,
}

impl InMemorySessionRegistry {
    pub fn new(counter: Arc<TrafficCounter>, bus: Arc<InMemoryEventBus>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            counter,
            bus,
            pipeline: RwLock::new(None),
        }
    }

    /// Send routed stanzas through `pipeline` on their way out.
    ///
    /// The pipeline routes through this registry, so only a weak handle is
    /// kept. Until one is attached, routed stanzas go straight to the wire.
    pub fn attach_pipeline(&self, pipeline: &Arc<dyn StanzaPipeline>) {
        *self.pipeline.write() = Some(Arc::downgrade(pipeline));
    }

    fn pipeline(&self) -> Option<Arc<dyn StanzaPipeline>> {
        self.pipeline.read().as_ref().and_then(Weak::upgrade)
    }

    /// Accept a session and bind its resource.
    ///
    /// Publishes `SessionCreated` followed by `ResourceBound`.
    pub async fn open(&self, address: Address) -> Arc<MemorySession> {
        let session = Arc::new(MemorySession::new(address.clone(), self.counter.clone()));
        if let Some(previous) = self
            .sessions
            .write()
            .insert(address.clone(), session.clone())
        {
            previous.close();
            debug!(address = %address, "Replaced existing session");
        }

        self.bus
            .publish(ServerEvent::SessionCreated {
                address: address.clone(),
            })
            .await;
        self.bus
            .publish(ServerEvent::ResourceBound {
                address: address.clone(),
            })
            .await;

        info!(address = %address, "Session bound");
        session
    }

    /// Close and forget a session. Returns false if it was not open.
    pub async fn close(&self, address: &Address) -> bool {
        let Some(session) = self.sessions.write().remove(address) else {
            return false;
        };
        session.close();
        self.bus
            .publish(ServerEvent::SessionClosed {
                address: address.clone(),
            })
            .await;
        info!(address = %address, "Session closed");
        true
    }

    pub fn get(&self, address: &Address) -> Option<Arc<MemorySession>> {
        self.sessions.read().get(address).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Sessions a stanza addressed to `target` should reach.
    fn recipients(&self, target: &Address) -> Vec<Arc<MemorySession>> {
        let sessions = self.sessions.read();
        if target.is_full() {
            return sessions.get(target).cloned().into_iter().collect();
        }
        sessions
            .values()
            .filter(|s| s.address.bare() == *target)
            .cloned()
            .collect()
    }
}

impl SessionDirectory for InMemorySessionRegistry {
    fn find(&self, address: &Address) -> Option<Arc<dyn LiveSession>> {
        self.get(address).map(|s| s as Arc<dyn LiveSession>)
    }
}

impl StanzaRouter for InMemorySessionRegistry {
    fn route(&self, stanza: &Stanza, session: &SessionInfo) -> Result<(), DeliveryError> {
        let Some(target) = stanza.to() else {
            debug!(from = %session.address, "Stanza addressed to the server, nothing to route");
            return Ok(());
        };

        let recipients = self.recipients(target);
        if recipients.is_empty() {
            debug!(to = %target, "No local session for target");
            return Ok(());
        }
        let Some(pipeline) = self.pipeline() else {
            for recipient in recipients {
                recipient.deliver(stanza.clone())?;
            }
            return Ok(());
        };

        for recipient in recipients {
            let outbound =
                SessionInfo::new(recipient.address.clone(), session.server_domain.clone());
            let mut copy = stanza.clone();
            if let DispatchOutcome::Dropped(rejection) =
                pipeline.dispatch(&mut copy, &outbound, Direction::Outgoing)?
            {
                trace!(to = %outbound.address, reason = %rejection, "Routed copy withheld");
            }
        }
        Ok(())
    }
}

impl StanzaTransport for InMemorySessionRegistry {
    fn send(&self, stanza: &Stanza, session: &SessionInfo) -> Result<(), DeliveryError> {
        let target = self
            .get(&session.address)
            .ok_or_else(|| DeliveryError::SessionClosed(session.address.to_string()))?;
        target.deliver(stanza.clone())
    }
}
