use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid base URL: {0} (expected http:// or https://)")]
    InvalidBaseUrl(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connection closed")]
    Closed,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
