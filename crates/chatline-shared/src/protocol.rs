use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::EVENT_NEW_MESSAGE;
use crate::error::ProtocolError;
use crate::types::{MessageId, UserId};

/// A chat message as stored by the persistence layer.
///
/// The realtime channel only reads it to route a notification; it never
/// mutates or stores messages itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image payload (URL or data URI), opaque to this crate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Message {
    /// True when this message belongs to the conversation between `a` and
    /// `b`, in either direction.
    pub fn involves(&self, a: &UserId, b: &UserId) -> bool {
        (self.sender_id == *a && self.receiver_id == *b)
            || (self.sender_id == *b && self.receiver_id == *a)
    }
}

/// Kinds of server-to-client events, used to (un)register handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewMessage,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NewMessage => EVENT_NEW_MESSAGE,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All events the server pushes over a realtime connection.
///
/// Encoded as `{"event": "<name>", "data": <payload>}` text frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A message addressed to (or sent by) the connected user was stored
    #[serde(rename = "newMessage")]
    NewMessage(Message),
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::NewMessage(_) => EventKind::NewMessage,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Message {
        Message {
            id: MessageId::parse("m1").unwrap(),
            sender_id: UserId::parse("alice").unwrap(),
            receiver_id: UserId::parse("bob").unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            text: Some("hi".into()),
            image: None,
        }
    }

    #[test]
    fn test_wire_format_matches_frontend_contract() {
        let json = ServerEvent::NewMessage(sample()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["event"], "newMessage");
        assert_eq!(value["data"]["_id"], "m1");
        assert_eq!(value["data"]["senderId"], "alice");
        assert_eq!(value["data"]["receiverId"], "bob");
        assert_eq!(value["data"]["text"], "hi");
        assert!(value["data"].get("image").is_none());
        assert!(value["data"]["createdAt"].as_str().unwrap().starts_with("2024-05-01T12:00:00"));
    }

    #[test]
    fn test_decode_event_without_optional_fields() {
        let raw = r#"{"event":"newMessage","data":{"_id":"m2","senderId":"bob","receiverId":"alice","createdAt":"2024-05-01T12:00:00Z","image":"https://cdn/x.png"}}"#;
        let event = ServerEvent::from_json(raw).unwrap();
        assert_eq!(event.kind(), EventKind::NewMessage);

        let ServerEvent::NewMessage(msg) = event;
        assert_eq!(msg.text, None);
        assert_eq!(msg.image.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let raw = r#"{"event":"typing","data":{}}"#;
        assert!(ServerEvent::from_json(raw).is_err());
    }

    #[test]
    fn test_involves_is_bidirectional() {
        let msg = sample();
        let alice = UserId::parse("alice").unwrap();
        let bob = UserId::parse("bob").unwrap();
        let carol = UserId::parse("carol").unwrap();

        assert!(msg.involves(&alice, &bob));
        assert!(msg.involves(&bob, &alice));
        assert!(!msg.involves(&alice, &carol));
        assert!(!msg.involves(&carol, &bob));
    }
}
