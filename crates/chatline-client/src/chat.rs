//! Conversation state fed by history fetches, own sends and realtime
//! `newMessage` events.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use chatline_shared::{EventKind, Message, ServerEvent, UserId};

use crate::connection::RealtimeConnection;

#[derive(Debug, Default)]
struct ChatState {
    messages: Vec<Message>,
    selected_partner: Option<UserId>,
}

impl ChatState {
    fn contains(&self, message: &Message) -> bool {
        self.messages.iter().any(|m| m.id == message.id)
    }

    fn append_unique(&mut self, message: Message) -> bool {
        if self.contains(&message) {
            trace!(message = %message.id, "Duplicate message ignored");
            return false;
        }
        self.messages.push(message);
        true
    }
}

/// Shared handle to the open conversation.
///
/// Clones point at the same state; the realtime handler holds one.
#[derive(Debug, Clone, Default)]
pub struct ChatStore {
    state: Arc<Mutex<ChatState>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn select_partner(&self, partner: UserId) {
        self.lock().selected_partner = Some(partner);
    }

    pub fn clear_partner(&self) {
        self.lock().selected_partner = None;
    }

    pub fn selected_partner(&self) -> Option<UserId> {
        self.lock().selected_partner.clone()
    }

    /// Snapshot of the conversation in display order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Replace the conversation with a freshly fetched history.
    pub fn load_history(&self, history: Vec<Message>) {
        self.lock().messages = history;
    }

    /// Append the stored copy of a message this user just sent. The same
    /// message may also arrive over the realtime channel; it is kept once.
    pub fn push_sent(&self, message: Message) -> bool {
        self.lock().append_unique(message)
    }

    /// Merge one realtime message into the open conversation.
    ///
    /// Messages outside the conversation between `self_id` and the partner
    /// selected right now are discarded, as are ids already present.
    pub fn apply_incoming(&self, self_id: &UserId, message: &Message) -> bool {
        let mut state = self.lock();
        let Some(partner) = state.selected_partner.as_ref() else {
            return false;
        };
        if !message.involves(self_id, partner) {
            trace!(message = %message.id, "Message outside open conversation ignored");
            return false;
        }
        state.append_unique(message.clone())
    }

    /// Start merging `newMessage` events from `conn`. Returns false (and
    /// registers nothing) when no partner is selected.
    ///
    /// Any handler from an earlier subscription on the same connection is
    /// replaced, so at most one is ever active.
    pub fn subscribe(&self, conn: &dyn RealtimeConnection, self_id: UserId) -> bool {
        if self.selected_partner().is_none() {
            return false;
        }

        let store = self.clone();
        conn.on(
            EventKind::NewMessage,
            Arc::new(move |event: &ServerEvent| match event {
                ServerEvent::NewMessage(message) => {
                    store.apply_incoming(&self_id, message);
                }
            }),
        );
        debug!("Subscribed to newMessage");
        true
    }

    /// Stop merging realtime events. Call when the conversation is left.
    pub fn unsubscribe(&self, conn: &dyn RealtimeConnection) {
        conn.off(EventKind::NewMessage);
        debug!("Unsubscribed from newMessage");
    }
}
