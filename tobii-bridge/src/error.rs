//! Error types for the Tobii bridge

use std::net::SocketAddr;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Bridge error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tungstenite::Error>),

    /// Tracking provider could not be brought up
    #[error("Tracking provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tracking provider failed while reading a frame
    #[error("Tracking provider read failed: {0}")]
    ProviderRead(String),

    /// No provider registered under this kind
    #[error("Unknown provider kind: {0}")]
    UnknownProvider(String),

    /// Socket bind failed at startup
    #[error("Failed to bind {transport} on {addr}: {source}")]
    Bind {
        /// Transport name (websocket, legacy-udp, discovery)
        transport: &'static str,
        /// Requested bind address
        addr: SocketAddr,
        /// Underlying socket error
        source: std::io::Error,
    },

    /// Invalid address in configuration
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Lifecycle method called in the wrong state
    #[error("Invalid lifecycle transition: {operation} while {state}")]
    InvalidState {
        /// Attempted operation
        operation: &'static str,
        /// Current lifecycle state
        state: &'static str,
    },

    /// Inbound command could not be parsed
    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    /// Thread panicked before it could be joined
    #[error("Thread panic: {0}")]
    ThreadPanic(&'static str),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<tungstenite::Error> for Error {
    fn from(e: tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(e))
    }
}
