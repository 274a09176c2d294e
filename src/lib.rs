//! # frame-relay
//!
//! A real-time WebSocket relay hub for live frame streams.
//!
//! Streamers publish opaque frames (typically JPEG images) under a stream id;
//! viewers subscribe to one stream id or to every stream with the `all`
//! wildcard. Frames wait briefly in a per-stream buffer and only the newest
//! fresh frame of each flush is relayed, so subscribers always see the most
//! recent picture instead of a growing backlog.
//!
//! ## Protocol
//!
//! ```text
//! client → server  {"type":"register","role":"streamer","streamId":"main"}
//! client → server  {"type":"frame","streamId":"main"}   then a binary frame
//! server → client  {"type":"active-streams","streams":["main"]}
//! server → client  {"type":"streamStatus","streamId":"main","activeViewers":2,"timestamp":...}
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use frame_relay::{RelayServer, ServerConfig};
//!
//! # async fn example() -> frame_relay::Result<()> {
//! let server = RelayServer::new(ServerConfig::default());
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use hub::{HubConfig, RelayHub};
pub use server::{RelayServer, ServerConfig};
