//! Relay server
//!
//! TCP listener, WebSocket handshake and the per-connection reader/writer
//! tasks that feed the hub.

pub mod config;
pub(crate) mod connection;
pub mod listener;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use listener::RelayServer;
