//! Connection table.
//!
//! The transport's view of live sockets: each connection gets a fresh
//! [`ConnectionId`] and a bounded outbound queue that its socket task
//! drains. Anything that wants to push to a connection goes through the
//! [`EventSink`] trait so it never touches socket handles directly.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use chatline_shared::{ConnectionId, ServerEvent};

use crate::error::DeliveryError;

/// Push-side capability of the transport.
pub trait EventSink: Send + Sync {
    /// Queue `event` for `connection_id` without waiting.
    fn emit(&self, connection_id: ConnectionId, event: ServerEvent) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone)]
pub struct ConnectionTable {
    outbound: Arc<DashMap<ConnectionId, mpsc::Sender<ServerEvent>>>,
    buffer: usize,
}

impl ConnectionTable {
    pub fn new(buffer: usize) -> Self {
        Self {
            outbound: Arc::new(DashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Allocate a connection id and its outbound queue.
    pub fn attach(&self) -> (ConnectionId, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let connection_id = ConnectionId::new();
        self.outbound.insert(connection_id, tx);
        debug!(conn = %connection_id, live = self.outbound.len(), "Attached connection");
        (connection_id, rx)
    }

    pub fn detach(&self, connection_id: ConnectionId) {
        if self.outbound.remove(&connection_id).is_some() {
            debug!(conn = %connection_id, live = self.outbound.len(), "Detached connection");
        }
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.outbound.contains_key(&connection_id)
    }

    pub fn len(&self) -> usize {
        self.outbound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty()
    }
}

impl Default for ConnectionTable {
    fn default() -> Self {
        Self::new(chatline_shared::constants::OUTBOUND_BUFFER)
    }
}

impl EventSink for ConnectionTable {
    fn emit(&self, connection_id: ConnectionId, event: ServerEvent) -> Result<(), DeliveryError> {
        // Clone the sender so the shard lock is not held across try_send
        let tx = self
            .outbound
            .get(&connection_id)
            .map(|entry| entry.value().clone())
            .ok_or(DeliveryError::UnknownConnection(connection_id))?;

        tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Backpressure(connection_id),
            TrySendError::Closed(_) => DeliveryError::Closed(connection_id),
        })
    }
}
