//! Client configuration.

use chatline_shared::constants::{HANDSHAKE_USER_PARAM, WS_PATH};
use chatline_shared::UserId;

use crate::error::{ClientError, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin hosting the realtime endpoint, without the `/api`
    /// suffix the REST client uses.
    /// Env: `CHATLINE_API_URL`
    /// Default: `http://localhost:5001`
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: &str) -> Self {
        Self {
            base_url: realtime_base(api_url),
        }
    }

    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        match std::env::var("CHATLINE_API_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(&url),
            _ => Self::default(),
        }
    }

    /// WebSocket URL for `user_id`'s realtime connection.
    pub fn ws_url(&self, user_id: &UserId) -> Result<String> {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(ClientError::InvalidBaseUrl(self.base_url.clone()));
        };

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(HANDSHAKE_USER_PARAM, user_id.as_str())
            .finish();

        Ok(format!("{base}{WS_PATH}?{query}"))
    }
}

/// The REST API lives under `/api`; the realtime endpoint sits at the root.
fn realtime_base(api_url: &str) -> String {
    let trimmed = api_url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/api")
        .unwrap_or(trimmed)
        .to_string()
}
