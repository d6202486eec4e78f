//! Presence registry.
//!
//! Maps each online user to the single connection that currently receives
//! their realtime events. Last connection wins: a second session for the
//! same user replaces the first one's entry without closing it.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use chatline_shared::{ConnectionId, UserId};

/// Shared, process-local presence table.
///
/// Cloning is cheap and yields a handle to the same table. Operations on
/// different users never contend; operations on the same user are
/// serialized by the map's shard lock.
#[derive(Debug, Clone, Default)]
pub struct PresenceRegistry {
    entries: Arc<DashMap<UserId, ConnectionId>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `user_id` at `connection_id`, returning the connection it
    /// replaced (if any and if different).
    pub fn register(&self, user_id: UserId, connection_id: ConnectionId) -> Option<ConnectionId> {
        let previous = self.entries.insert(user_id.clone(), connection_id);
        match previous {
            Some(old) if old != connection_id => {
                debug!(
                    user = %user_id,
                    old_conn = %old,
                    new_conn = %connection_id,
                    "Presence entry superseded by newer connection"
                );
                Some(old)
            }
            _ => None,
        }
    }

    /// Remove the entry for `user_id` only if it still points at
    /// `connection_id`. Returns whether an entry was removed.
    ///
    /// A disconnect from a connection that has already been replaced leaves
    /// the newer entry in place.
    pub fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let removed = self
            .entries
            .remove_if(user_id, |_, current| *current == connection_id)
            .is_some();

        if !removed {
            match self.entries.get(user_id) {
                Some(current) => debug!(
                    user = %user_id,
                    stale_conn = %connection_id,
                    current_conn = %current.value(),
                    "Ignoring stale unregister"
                ),
                None => debug!(user = %user_id, "Unregister for absent user"),
            }
        }

        removed
    }

    pub fn lookup(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.entries.get(user_id).map(|entry| *entry)
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.entries.contains_key(user_id)
    }

    /// Snapshot of all users with a live entry, sorted for stable output.
    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.entries.iter().map(|e| e.key().clone()).collect();
        users.sort();
        users
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
