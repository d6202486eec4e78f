//! WebSocket transport for the realtime channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use chatline_shared::{EventKind, ServerEvent, UserId};

use crate::config::ClientConfig;
use crate::connection::{Connector, RealtimeConnection};
use crate::error::ClientError;
use crate::events::{EventHandler, HandlerTable};

/// Opens [`WsConnection`]s against the configured server.
#[derive(Debug, Clone)]
pub struct WsConnector {
    config: ClientConfig,
}

impl WsConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, user_id: &UserId) -> Result<Box<dyn RealtimeConnection>, ClientError> {
        let url = self.config.ws_url(user_id)?;
        let conn = WsConnection::open(&url).await?;
        info!(user = %user_id, "Realtime connection established");
        Ok(Box::new(conn))
    }
}

/// Client end of a realtime WebSocket.
///
/// A background task reads frames, decodes them into [`ServerEvent`]s and
/// hands each one to the handler registered for its kind.
pub struct WsConnection {
    handlers: HandlerTable,
    connected: Arc<AtomicBool>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl WsConnection {
    pub async fn open(url: &str) -> Result<Self, ClientError> {
        let (mut stream, _) = connect_async(url).await?;

        let handlers = HandlerTable::new();
        let connected = Arc::new(AtomicBool::new(true));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task_handlers = handlers.clone();
        let task_connected = Arc::clone(&connected);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Fires on disconnect() and when the connection is dropped
                    _ = &mut shutdown_rx => {
                        if let Err(e) = stream.close(None).await {
                            debug!(error = %e, "Close handshake failed");
                        }
                        break;
                    }
                    frame = stream.next() => match frame {
                        Some(Ok(Message::Text(text))) => match ServerEvent::from_json(&text) {
                            Ok(event) => {
                                task_handlers.dispatch(&event);
                            }
                            Err(e) => warn!(error = %e, "Skipping undecodable server event"),
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("Server closed realtime connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Realtime connection failed");
                            break;
                        }
                    },
                }
            }
            task_connected.store(false, Ordering::SeqCst);
        });

        Ok(Self {
            handlers,
            connected,
            shutdown: Mutex::new(Some(shutdown_tx)),
        })
    }
}

impl RealtimeConnection for WsConnection {
    fn on(&self, kind: EventKind, handler: EventHandler) {
        self.handlers.set(kind, handler);
    }

    fn off(&self, kind: EventKind) {
        self.handlers.remove(kind);
    }

    fn disconnect(&self) {
        let tx = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
        self.connected.store(false, Ordering::SeqCst);
        self.handlers.clear();
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
