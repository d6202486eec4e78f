//! # chatline-server
//!
//! Realtime delivery server for chatline.
//!
//! This crate provides:
//! - **Presence registry** mapping each online user to their live connection
//! - **Connection lifecycle** that registers on handshake and releases on
//!   disconnect, ignoring stale disconnects from superseded connections
//! - **Notifier** that pushes a `newMessage` event to an online receiver
//!   once the message service has stored a message
//! - **HTTP API** (axum) with the `/ws` upgrade, `/notify` hook, `/presence`
//!   and `/health`

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod notifier;
pub mod presence;
pub mod transport;
pub mod ws;

pub use api::{build_router, serve, serve_listener, AppState};
pub use config::ServerConfig;
pub use lifecycle::{ConnectionState, Lifecycle, LiveConnection};
pub use notifier::{Delivery, Notifier};
pub use presence::PresenceRegistry;
pub use transport::{ConnectionTable, EventSink};
