use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use chatline_shared::constants::WS_PATH;
use chatline_shared::{Message, UserId};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::lifecycle::Lifecycle;
use crate::notifier::Notifier;
use crate::presence::PresenceRegistry;
use crate::transport::ConnectionTable;
use crate::ws::ws_handler;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Lifecycle,
    pub notifier: Notifier<ConnectionTable>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build a fresh presence registry and connection table wired to one
    /// lifecycle handler and one notifier.
    pub fn new(config: ServerConfig) -> Self {
        let presence = PresenceRegistry::new();
        let connections = ConnectionTable::new(config.outbound_buffer);
        let notifier = Notifier::new(presence.clone(), Arc::new(connections.clone()));

        Self {
            lifecycle: Lifecycle::new(presence, connections),
            notifier,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Skipping invalid allowed origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_check))
        .route("/presence", get(online_users))
        .route("/notify", post(notify))
        .route(WS_PATH, get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct PresenceResponse {
    online: Vec<UserId>,
}

#[derive(Serialize)]
struct NotifyResponse {
    delivered: bool,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn online_users(State(state): State<AppState>) -> Json<PresenceResponse> {
    Json(PresenceResponse {
        online: state.lifecycle.presence().online_users(),
    })
}

/// Called by the message service right after it stored `message`.
async fn notify(
    headers: HeaderMap,
    State(state): State<AppState>,
    payload: Result<Json<Message>, JsonRejection>,
) -> Result<(StatusCode, Json<NotifyResponse>), ServerError> {
    verify_notify_token(&headers, &state.config)?;
    let Json(message) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let delivery = state.notifier.notify(&message);
    info!(
        message = %message.id,
        receiver = %message.receiver_id,
        delivery = ?delivery,
        "Processed notify request"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(NotifyResponse {
            delivered: delivery.is_delivered(),
        }),
    ))
}

fn verify_notify_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.notify_token else {
        return Ok(());
    };

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    use subtle::ConstantTimeEq;
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Unauthorized("Invalid notify token".into()));
    }

    Ok(())
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Starting HTTP server");
    serve_listener(state, listener).await
}

/// Serve on an already bound listener.
pub async fn serve_listener(
    state: AppState,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
