//! # chatline-client
//!
//! Client side of the chatline realtime channel: one WebSocket per signed-in
//! session, with `newMessage` events filtered to the open conversation and
//! deduplicated before they reach the message list.

pub mod chat;
pub mod config;
pub mod connection;
pub mod events;
pub mod session;
pub mod ws;

mod error;

pub use chat::ChatStore;
pub use config::ClientConfig;
pub use connection::{Connector, RealtimeConnection};
pub use error::{ClientError, Result};
pub use events::{EventHandler, HandlerTable};
pub use session::AuthSession;
pub use ws::{WsConnection, WsConnector};
