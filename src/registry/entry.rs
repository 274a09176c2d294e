//! Connection entry types
//!
//! This module defines the per-connection state stored in the registry.

use std::time::Instant;

use crate::protocol::Role;
use crate::session::{ClientInfo, ConnectionHandle, ConnectionId, ConnectionState};

/// Entry for a single connection in the registry
#[derive(Debug)]
pub struct ConnectionEntry {
    /// Outbound queue to the connection's writer task
    pub handle: ConnectionHandle,

    /// Lifecycle state
    pub state: ConnectionState,

    /// Declared role and stream (None until the first `register`)
    pub info: Option<ClientInfo>,

    /// Stream id set by a `frame` message, consumed by the next data payload
    pub primed_stream: Option<String>,
}

impl ConnectionEntry {
    /// Create an entry for a connection whose handshake just completed
    pub(super) fn open(handle: ConnectionHandle, connected_at: Instant, now: Instant) -> Self {
        let mut state = ConnectionState::new(handle.id(), handle.peer_addr(), connected_at);
        state.open(now);

        Self {
            handle,
            state,
            info: None,
            primed_stream: None,
        }
    }

    /// Connection identity
    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    /// Declared role, if registered
    pub fn role(&self) -> Option<Role> {
        self.info.as_ref().map(|info| info.role)
    }

    /// Whether the connection is open and its writer is still running
    pub fn is_live(&self) -> bool {
        self.state.is_open() && !self.handle.is_closed()
    }

    /// Whether relayed frames of `stream_id` go to this connection
    pub fn subscribes_to(&self, stream_id: &str) -> bool {
        self.info
            .as_ref()
            .is_some_and(|info| info.subscribes_to(stream_id))
    }
}
