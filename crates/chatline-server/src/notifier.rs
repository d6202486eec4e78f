//! Realtime fan-out of freshly stored messages.
//!
//! The message-send path stores a message first and then calls
//! [`Notifier::notify`]. If the receiver is online they get a `newMessage`
//! event on their current connection; otherwise nothing happens and the
//! message is picked up on the next history fetch. There is no queue and
//! no retry.

use std::sync::Arc;

use tracing::debug;

use chatline_shared::{ConnectionId, Message, ServerEvent};

use crate::presence::PresenceRegistry;
use crate::transport::EventSink;

/// Outcome of a single notification. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued on the receiver's connection
    Delivered(ConnectionId),
    /// Receiver has no live connection
    Offline,
    /// Receiver looked online but the push failed (connection closing,
    /// buffer full)
    Dropped(ConnectionId),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }
}

pub struct Notifier<S> {
    presence: PresenceRegistry,
    sink: Arc<S>,
}

impl<S> Clone for Notifier<S> {
    fn clone(&self) -> Self {
        Self {
            presence: self.presence.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: EventSink> Notifier<S> {
    pub fn new(presence: PresenceRegistry, sink: Arc<S>) -> Self {
        Self { presence, sink }
    }

    /// Push `message` to its receiver if they are online.
    pub fn notify(&self, message: &Message) -> Delivery {
        let Some(connection_id) = self.presence.lookup(&message.receiver_id) else {
            debug!(
                message = %message.id,
                receiver = %message.receiver_id,
                "Receiver offline, skipping realtime push"
            );
            return Delivery::Offline;
        };

        match self
            .sink
            .emit(connection_id, ServerEvent::NewMessage(message.clone()))
        {
            Ok(()) => {
                debug!(
                    message = %message.id,
                    receiver = %message.receiver_id,
                    conn = %connection_id,
                    "Pushed newMessage"
                );
                Delivery::Delivered(connection_id)
            }
            Err(e) => {
                debug!(
                    message = %message.id,
                    receiver = %message.receiver_id,
                    error = %e,
                    "Dropping realtime push"
                );
                Delivery::Dropped(connection_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Lifecycle;
    use crate::transport::ConnectionTable;
    use chatline_shared::{MessageId, UserId};

    fn user(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn message(id: &str, from: &str, to: &str, text: &str) -> Message {
        Message {
            id: MessageId::parse(id).unwrap(),
            sender_id: user(from),
            receiver_id: user(to),
            created_at: chrono::Utc::now(),
            text: Some(text.into()),
            image: None,
        }
    }

    fn setup() -> (Lifecycle, Notifier<ConnectionTable>) {
        let presence = PresenceRegistry::new();
        let table = ConnectionTable::default();
        let notifier = Notifier::new(presence.clone(), Arc::new(table.clone()));
        (Lifecycle::new(presence, table), notifier)
    }

    #[tokio::test]
    async fn test_online_receiver_gets_exactly_one_event() {
        let (lc, notifier) = setup();
        let mut bob = lc.connect(Some(user("bob")));
        let msg = message("m1", "alice", "bob", "hi");

        assert_eq!(notifier.notify(&msg), Delivery::Delivered(bob.id()));
        assert_eq!(bob.next_event().await, Some(ServerEvent::NewMessage(msg)));
        assert_eq!(bob.try_next_event(), None);
    }

    #[test]
    fn test_offline_receiver_gets_nothing() {
        let (_lc, notifier) = setup();
        let msg = message("m1", "alice", "bob", "hi");
        assert_eq!(notifier.notify(&msg), Delivery::Offline);
    }

    #[tokio::test]
    async fn test_only_receiver_is_notified() {
        let (lc, notifier) = setup();
        let mut alice = lc.connect(Some(user("alice")));
        let mut bob = lc.connect(Some(user("bob")));

        notifier.notify(&message("m1", "alice", "bob", "hi"));

        assert!(bob.next_event().await.is_some());
        assert_eq!(alice.try_next_event(), None);
    }

    #[tokio::test]
    async fn test_ordering_follows_notify_order() {
        let (lc, notifier) = setup();
        let mut bob = lc.connect(Some(user("bob")));

        for i in 0..5 {
            notifier.notify(&message(&format!("m{i}"), "alice", "bob", "x"));
        }

        for i in 0..5 {
            let Some(ServerEvent::NewMessage(msg)) = bob.next_event().await else {
                panic!("expected newMessage");
            };
            assert_eq!(msg.id.as_str(), format!("m{i}"));
        }
    }

    #[tokio::test]
    async fn test_reconnect_routes_to_newest_connection() {
        let (lc, notifier) = setup();
        let mut old = lc.connect(Some(user("bob")));
        let mut new = lc.connect(Some(user("bob")));
        old.close();

        let msg = message("m1", "alice", "bob", "hi");
        assert_eq!(notifier.notify(&msg), Delivery::Delivered(new.id()));
        assert_eq!(new.next_event().await, Some(ServerEvent::NewMessage(msg)));
    }

    #[test]
    fn test_failed_push_is_swallowed() {
        let presence = PresenceRegistry::new();
        let table = ConnectionTable::default();
        let notifier = Notifier::new(presence.clone(), Arc::new(table));

        // Presence entry without a live connection behind it
        let ghost = ConnectionId::new();
        presence.register(user("bob"), ghost);

        let msg = message("m1", "alice", "bob", "hi");
        assert_eq!(notifier.notify(&msg), Delivery::Dropped(ghost));
    }

    #[tokio::test]
    async fn test_end_to_end_send_then_disconnect() {
        let (lc, notifier) = setup();
        let _alice = lc.connect(Some(user("alice")));
        let mut bob = lc.connect(Some(user("bob")));
        assert_eq!(lc.presence().len(), 2);

        let first = message("m1", "alice", "bob", "hi");
        assert!(notifier.notify(&first).is_delivered());
        let Some(ServerEvent::NewMessage(got)) = bob.next_event().await else {
            panic!("expected newMessage");
        };
        assert_eq!(got.text.as_deref(), Some("hi"));
        assert_eq!(got.sender_id, user("alice"));
        assert_eq!(got.receiver_id, user("bob"));

        bob.close();
        assert!(!lc.presence().is_online(&user("bob")));

        let second = message("m2", "alice", "bob", "still there?");
        assert_eq!(notifier.notify(&second), Delivery::Offline);
    }
}
