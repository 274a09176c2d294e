//! Per-connection session types
//!
//! Lifecycle state, declared client info, and the outbound handle used by
//! the hub to reach a connection's writer task.

pub mod handle;
pub mod state;

pub use handle::{ConnectionHandle, ConnectionId, Outbound, SendError};
pub use state::{ClientInfo, ConnectionPhase, ConnectionState};
