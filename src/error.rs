//! Error types
//!
//! Errors that escape the relay. Per-recipient send failures and undecodable
//! payloads are handled inside the hub and never surface here.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relay server operations
#[derive(Error, Debug)]
pub enum Error {
    /// Socket or listener I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or protocol failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON encoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The hub task is no longer accepting events
    #[error("Relay hub stopped")]
    HubStopped,
}
