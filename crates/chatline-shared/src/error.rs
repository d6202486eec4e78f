use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("User identifier must not be empty")]
    EmptyUserId,

    #[error("Message identifier must not be empty")]
    EmptyMessageId,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
