//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;

use chatline_shared::constants::{DEFAULT_ALLOWED_ORIGIN, DEFAULT_HTTP_PORT, OUTBOUND_BUFFER};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP + WebSocket server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5001`
    pub http_addr: SocketAddr,

    /// Origins allowed to open cross-origin connections.
    /// Env: `ALLOWED_ORIGINS` (comma-separated)
    /// Default: `http://localhost:5173`
    pub allowed_origins: Vec<String>,

    /// Bearer token the persistence service must present on `/notify`.
    /// Env: `NOTIFY_TOKEN`
    /// Default: empty (endpoint unauthenticated, for local development).
    pub notify_token: Option<String>,

    /// Per-connection outbound event buffer.
    /// Env: `OUTBOUND_BUFFER`
    /// Default: `256`
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            notify_token: None,
            outbound_buffer: OUTBOUND_BUFFER,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            let parsed = parse_origins(&origins);
            if parsed.is_empty() {
                tracing::warn!(value = %origins, "Empty ALLOWED_ORIGINS, using default");
            } else {
                config.allowed_origins = parsed;
            }
        }

        if let Some(token) = lookup("NOTIFY_TOKEN") {
            if !token.is_empty() {
                config.notify_token = Some(token);
            }
        }

        if let Some(val) = lookup("OUTBOUND_BUFFER") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.outbound_buffer = n,
                _ => tracing::warn!(value = %val, "Invalid OUTBOUND_BUFFER, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 5001).into());
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173"]);
        assert!(config.notify_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("ALLOWED_ORIGINS", "https://chat.example.com/, http://localhost:3000"),
            ("NOTIFY_TOKEN", "s3cret"),
            ("OUTBOUND_BUFFER", "16"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(
            config.allowed_origins,
            vec!["https://chat.example.com", "http://localhost:3000"]
        );
        assert_eq!(config.notify_token.as_deref(), Some("s3cret"));
        assert_eq!(config.outbound_buffer, 16);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("ALLOWED_ORIGINS", " , "),
            ("NOTIFY_TOKEN", ""),
            ("OUTBOUND_BUFFER", "0"),
        ]);
        let default = ServerConfig::default();
        assert_eq!(config.http_addr, default.http_addr);
        assert_eq!(config.allowed_origins, default.allowed_origins);
        assert!(config.notify_token.is_none());
        assert_eq!(config.outbound_buffer, default.outbound_buffer);
    }
}
