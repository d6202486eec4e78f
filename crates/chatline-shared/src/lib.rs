//! # chatline-shared
//!
//! Types shared by the chatline realtime server and its clients: user and
//! connection identifiers, the persisted [`Message`](protocol::Message)
//! record and the typed [`ServerEvent`](protocol::ServerEvent) union that
//! travels over the realtime channel.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::ProtocolError;
pub use protocol::{EventKind, Message, ServerEvent};
pub use types::{ConnectionId, MessageId, UserId};
