use tracing::info;
use tracing_subscriber::EnvFilter;

use chatline_server::{serve, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,chatline_server=debug")),
        )
        .init();

    info!("Starting chatline server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        addr = %config.http_addr,
        origins = ?config.allowed_origins,
        notify_auth = config.notify_token.is_some(),
        outbound_buffer = config.outbound_buffer,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Build shared state (presence registry, connection table, notifier)
    // -----------------------------------------------------------------------
    let http_addr = config.http_addr;
    let state = AppState::new(config);

    // -----------------------------------------------------------------------
    // 4. Run the HTTP + WebSocket server until shutdown
    // -----------------------------------------------------------------------
    // Presence lives in memory only; clients re-register when they reconnect.
    tokio::select! {
        result = serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
