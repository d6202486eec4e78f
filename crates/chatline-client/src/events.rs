//! Inbound event handlers.
//!
//! A [`HandlerTable`] holds at most one handler per [`EventKind`];
//! registering a second handler for the same kind replaces the first, so
//! repeated subscriptions can never stack up and deliver an event twice.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chatline_shared::{EventKind, ServerEvent};

pub type EventHandler = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: Arc<Mutex<HashMap<EventKind, EventHandler>>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` for `kind`. Returns true if it replaced one.
    pub fn set(&self, kind: EventKind, handler: EventHandler) -> bool {
        let replaced = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, handler)
            .is_some();
        if replaced {
            tracing::debug!(event = %kind, "Replaced existing event handler");
        }
        replaced
    }

    pub fn remove(&self, kind: EventKind) -> bool {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind)
            .is_some()
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    /// Run the handler registered for the event's kind, if any. Returns
    /// whether a handler ran.
    pub fn dispatch(&self, event: &ServerEvent) -> bool {
        // Release the lock before calling out so a handler may (un)register
        let handler = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind())
            .cloned();

        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => {
                tracing::trace!(event = %event.kind(), "No handler registered");
                false
            }
        }
    }

    pub fn clear(&self) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chatline_shared::{Message, MessageId, UserId};

    fn event() -> ServerEvent {
        ServerEvent::NewMessage(Message {
            id: MessageId::parse("m1").unwrap(),
            sender_id: UserId::parse("alice").unwrap(),
            receiver_id: UserId::parse("bob").unwrap(),
            created_at: chrono::Utc::now(),
            text: None,
            image: None,
        })
    }

    fn counter() -> (Arc<AtomicUsize>, EventHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            count,
            Arc::new(move |_: &ServerEvent| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_dispatch_without_handler() {
        let table = HandlerTable::new();
        assert!(!table.dispatch(&event()));
    }

    #[test]
    fn test_second_registration_replaces_first() {
        let table = HandlerTable::new();
        let (first, h1) = counter();
        let (second, h2) = counter();

        assert!(!table.set(EventKind::NewMessage, h1));
        assert!(table.set(EventKind::NewMessage, h2));
        table.dispatch(&event());

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_stops_dispatch() {
        let table = HandlerTable::new();
        let (count, handler) = counter();
        table.set(EventKind::NewMessage, handler);

        assert!(table.remove(EventKind::NewMessage));
        assert!(!table.remove(EventKind::NewMessage));
        assert!(!table.dispatch(&event()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_unregister_itself() {
        let table = HandlerTable::new();
        let inner = table.clone();
        table.set(
            EventKind::NewMessage,
            Arc::new(move |_: &ServerEvent| {
                inner.remove(EventKind::NewMessage);
            }),
        );

        assert!(table.dispatch(&event()));
        assert!(!table.contains(EventKind::NewMessage));
    }
}
