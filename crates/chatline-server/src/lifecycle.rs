//! Per-connection lifecycle.
//!
//! ```text
//! Connecting --(user id)--> Active(user) ----\
//!      \                                      +--(disconnect)--> Closed
//!       `--(no user id)--> ActiveAnonymous --/
//! ```
//!
//! A reconnecting client opens a new connection and starts over from
//! `Connecting`; there is no resume.

use tokio::sync::mpsc;
use tracing::{debug, info};

use chatline_shared::{ConnectionId, ServerEvent, UserId};

use crate::presence::PresenceRegistry;
use crate::transport::ConnectionTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active(UserId),
    ActiveAnonymous,
    Closed,
}

/// Opens and closes connections against the shared presence and
/// connection tables.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    presence: PresenceRegistry,
    connections: ConnectionTable,
}

impl Lifecycle {
    pub fn new(presence: PresenceRegistry, connections: ConnectionTable) -> Self {
        Self {
            presence,
            connections,
        }
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    /// Complete the handshake for a new connection.
    pub fn connect(&self, user_id: Option<UserId>) -> LiveConnection {
        let (id, outbound) = self.connections.attach();
        let mut conn = LiveConnection {
            id,
            state: ConnectionState::Connecting,
            outbound,
            presence: self.presence.clone(),
            connections: self.connections.clone(),
        };

        conn.state = match user_id {
            Some(user_id) => {
                self.presence.register(user_id.clone(), id);
                info!(user = %user_id, conn = %id, "User connected");
                ConnectionState::Active(user_id)
            }
            None => {
                debug!(conn = %id, "No user id in handshake, skipping registration");
                ConnectionState::ActiveAnonymous
            }
        };

        conn
    }
}

/// One physical connection between handshake and disconnect.
///
/// Dropping it closes it, so every exit path of a socket task releases
/// its presence entry.
#[derive(Debug)]
pub struct LiveConnection {
    id: ConnectionId,
    state: ConnectionState,
    outbound: mpsc::Receiver<ServerEvent>,
    presence: PresenceRegistry,
    connections: ConnectionTable,
}

impl LiveConnection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match &self.state {
            ConnectionState::Active(user_id) => Some(user_id),
            _ => None,
        }
    }

    /// Next event queued for this connection. `None` once closed.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        if self.state == ConnectionState::Closed {
            return None;
        }
        self.outbound.recv().await
    }

    /// Next queued event, without waiting.
    pub fn try_next_event(&mut self) -> Option<ServerEvent> {
        self.outbound.try_recv().ok()
    }

    /// Handle the disconnect. Safe to call more than once.
    pub fn close(&mut self) {
        let previous = std::mem::replace(&mut self.state, ConnectionState::Closed);
        match previous {
            ConnectionState::Closed => return,
            ConnectionState::Active(user_id) => {
                let removed = self.presence.unregister(&user_id, self.id);
                info!(
                    user = %user_id,
                    conn = %self.id,
                    presence_removed = removed,
                    "User disconnected"
                );
            }
            ConnectionState::ActiveAnonymous | ConnectionState::Connecting => {
                debug!(conn = %self.id, "Anonymous connection closed");
            }
        }

        self.connections.detach(self.id);
        self.outbound.close();
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn lifecycle() -> Lifecycle {
        Lifecycle::new(PresenceRegistry::new(), ConnectionTable::default())
    }

    #[test]
    fn test_connect_with_user_registers() {
        let lc = lifecycle();
        let conn = lc.connect(Some(user("alice")));

        assert_eq!(conn.state(), &ConnectionState::Active(user("alice")));
        assert_eq!(lc.presence().lookup(&user("alice")), Some(conn.id()));
        assert!(lc.connections().contains(conn.id()));
    }

    #[test]
    fn test_anonymous_connection_skips_registry() {
        let lc = lifecycle();
        let conn = lc.connect(None);

        assert_eq!(conn.state(), &ConnectionState::ActiveAnonymous);
        assert_eq!(conn.user_id(), None);
        assert!(lc.presence().is_empty());
        assert!(lc.connections().contains(conn.id()));
    }

    #[test]
    fn test_close_unregisters_and_detaches() {
        let lc = lifecycle();
        let mut conn = lc.connect(Some(user("alice")));
        let id = conn.id();

        conn.close();
        conn.close();

        assert_eq!(conn.state(), &ConnectionState::Closed);
        assert!(lc.presence().is_empty());
        assert!(!lc.connections().contains(id));
    }

    #[test]
    fn test_drop_closes() {
        let lc = lifecycle();
        {
            let _conn = lc.connect(Some(user("alice")));
            assert!(lc.presence().is_online(&user("alice")));
        }
        assert!(!lc.presence().is_online(&user("alice")));
        assert!(lc.connections().is_empty());
    }

    #[test]
    fn test_late_disconnect_of_old_connection_keeps_new_one() {
        let lc = lifecycle();
        let mut old = lc.connect(Some(user("alice")));
        let new = lc.connect(Some(user("alice")));

        old.close();

        assert_eq!(lc.presence().lookup(&user("alice")), Some(new.id()));
        assert!(lc.connections().contains(new.id()));
    }

    #[tokio::test]
    async fn test_next_event_after_close_is_none() {
        let lc = lifecycle();
        let mut conn = lc.connect(Some(user("alice")));
        conn.close();
        assert_eq!(conn.next_event().await, None);
    }
}
