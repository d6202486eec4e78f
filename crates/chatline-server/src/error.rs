use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use chatline_shared::ConnectionId;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Why an event could not be handed to a connection.
///
/// Never surfaced to the sender of a message; the notifier logs it and
/// moves on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("No live connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("Connection {0} is closed")]
    Closed(ConnectionId),

    #[error("Outbound buffer full for connection {0}")]
    Backpressure(ConnectionId),
}
