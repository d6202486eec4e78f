//! WebSocket endpoint.
//!
//! `GET /ws?userId=<id>` upgrades to a realtime connection. The socket task
//! forwards queued [`ServerEvent`]s as JSON text frames until the client
//! goes away, then closes the lifecycle so presence is released.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use chatline_shared::UserId;

use crate::api::AppState;
use crate::lifecycle::Lifecycle;

/// Connection metadata sent with the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct Handshake {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(handshake): Query<Handshake>,
    State(state): State<AppState>,
) -> Response {
    let user_id = UserId::from_handshake(handshake.user_id.as_deref());
    let lifecycle = state.lifecycle.clone();
    ws.on_upgrade(move |socket| run_socket(socket, lifecycle, user_id))
}

async fn run_socket(socket: WebSocket, lifecycle: Lifecycle, user_id: Option<UserId>) {
    let mut conn = lifecycle.connect(user_id);
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = conn.next_event() => {
                let Some(event) = event else {
                    break;
                };
                let text = match event.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(conn = %conn.id(), error = %e, "Failed to encode event");
                        continue;
                    }
                };
                if let Err(e) = sender.send(WsMessage::Text(text)).await {
                    debug!(conn = %conn.id(), error = %e, "Socket write failed");
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    None | Some(Ok(WsMessage::Close(_))) => break,
                    Some(Ok(WsMessage::Text(_))) | Some(Ok(WsMessage::Binary(_))) => {
                        // Chat actions go through the REST API, not this channel
                        debug!(conn = %conn.id(), "Ignoring inbound frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(conn = %conn.id(), error = %e, "Socket read failed");
                        break;
                    }
                }
            }
        }
    }

    conn.close();
}
