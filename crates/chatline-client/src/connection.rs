//! The narrow slice of a realtime transport the rest of the client needs.

use async_trait::async_trait;

use chatline_shared::{EventKind, UserId};

use crate::error::ClientError;
use crate::events::EventHandler;

/// A live (or formerly live) realtime connection.
pub trait RealtimeConnection: Send + Sync {
    /// Register `handler` for `kind`, replacing any handler already
    /// registered for it.
    fn on(&self, kind: EventKind, handler: EventHandler);

    /// Remove the handler for `kind`, if any.
    fn off(&self, kind: EventKind);

    /// Close the connection. Idempotent.
    fn disconnect(&self);

    fn is_connected(&self) -> bool;
}

/// Opens realtime connections on behalf of an authenticated user.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, user_id: &UserId) -> Result<Box<dyn RealtimeConnection>, ClientError>;
}
