/// Query parameter carrying the user identifier during the WebSocket handshake
pub const HANDSHAKE_USER_PARAM: &str = "userId";

/// Path of the realtime WebSocket endpoint
pub const WS_PATH: &str = "/ws";

/// Event name pushed to a receiver when a message addressed to them is stored
pub const EVENT_NEW_MESSAGE: &str = "newMessage";

/// Capacity of the per-connection outbound event buffer
pub const OUTBOUND_BUFFER: usize = 256;

/// Default HTTP port (server)
pub const DEFAULT_HTTP_PORT: u16 = 5001;

/// Origin of the development frontend, allowed by default for CORS
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
