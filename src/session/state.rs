//! Connection state machine
//!
//! Tracks a relay connection from TCP accept to cleanup:
//!
//! ```text
//! Connecting -> Open -> Closing -> Closed
//!                  \--------------> Errored
//! ```
//!
//! No transition ever returns to `Open`, and the terminal transition reports
//! `true` exactly once so cleanup runs a single time.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::protocol::{Role, WILDCARD_STREAM};

use super::handle::ConnectionId;

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// TCP accepted, WebSocket handshake not complete
    Connecting,
    /// Handshake complete, exchanging messages
    Open,
    /// Close frame received or sent
    Closing,
    /// Closed cleanly
    Closed,
    /// Transport error
    Errored,
}

impl ConnectionPhase {
    /// Whether the connection has reached a terminal phase
    pub fn is_terminated(&self) -> bool {
        matches!(self, ConnectionPhase::Closed | ConnectionPhase::Errored)
    }
}

/// Declared role and target stream of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Declared role
    pub role: Role,
    /// Target stream id, or `all` for subscribers of every stream
    pub stream_id: String,
}

impl ClientInfo {
    /// Create client info
    pub fn new(role: Role, stream_id: impl Into<String>) -> Self {
        Self {
            role,
            stream_id: stream_id.into(),
        }
    }

    /// Whether this client subscribes to every stream
    pub fn is_wildcard(&self) -> bool {
        self.stream_id == WILDCARD_STREAM
    }

    /// Whether frames of `stream_id` should be delivered to this client
    pub fn subscribes_to(&self, stream_id: &str) -> bool {
        self.role.is_subscriber() && (self.stream_id == stream_id || self.is_wildcard())
    }
}

/// Lifecycle state of one connection
#[derive(Debug, Clone)]
pub struct ConnectionState {
    /// Connection identity
    pub id: ConnectionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: ConnectionPhase,

    /// TCP accept time
    pub connected_at: Instant,

    /// Handshake completion time
    pub opened_at: Option<Instant>,

    /// Last inbound message or heartbeat
    pub last_activity: Instant,
}

impl ConnectionState {
    /// Create a connection in the `Connecting` phase
    pub fn new(id: ConnectionId, peer_addr: SocketAddr, now: Instant) -> Self {
        Self {
            id,
            peer_addr,
            phase: ConnectionPhase::Connecting,
            connected_at: now,
            opened_at: None,
            last_activity: now,
        }
    }

    /// Handshake completed
    pub fn open(&mut self, now: Instant) {
        if self.phase == ConnectionPhase::Connecting {
            self.phase = ConnectionPhase::Open;
            self.opened_at = Some(now);
            self.last_activity = now;
        }
    }

    /// Record inbound activity (message or pong)
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Close handshake started
    pub fn begin_close(&mut self) {
        if matches!(self.phase, ConnectionPhase::Connecting | ConnectionPhase::Open) {
            self.phase = ConnectionPhase::Closing;
        }
    }

    /// Connection closed cleanly.
    ///
    /// Returns `true` only for the call that terminated the connection.
    pub fn finish_close(&mut self) -> bool {
        if self.phase.is_terminated() {
            return false;
        }
        self.phase = ConnectionPhase::Closed;
        true
    }

    /// Connection failed.
    ///
    /// Returns `true` only for the call that terminated the connection.
    pub fn fail(&mut self) -> bool {
        if self.phase.is_terminated() {
            return false;
        }
        self.phase = ConnectionPhase::Errored;
        true
    }

    /// Check if the connection can exchange messages
    pub fn is_open(&self) -> bool {
        self.phase == ConnectionPhase::Open
    }

    /// Time since the last inbound activity
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }
}
