//! Events delivered from connection tasks to the hub

use std::time::Instant;

use bytes::Bytes;

use crate::session::{ConnectionHandle, ConnectionId};

/// Inbound event for the hub task
#[derive(Debug)]
pub enum HubEvent {
    /// WebSocket handshake completed
    Opened {
        handle: ConnectionHandle,
        connected_at: Instant,
    },
    /// Text or binary message received
    Message { id: ConnectionId, payload: Bytes },
    /// Pong received
    Heartbeat { id: ConnectionId },
    /// Close frame received
    Closing { id: ConnectionId },
    /// Connection closed
    Closed { id: ConnectionId },
    /// Transport failure
    Errored { id: ConnectionId, cause: String },
}
