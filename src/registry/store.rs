//! Connection registry implementation
//!
//! Tracks every live connection with its declared role and target stream.
//! Owned by the hub task, so no locking is needed.

use std::collections::HashMap;
use std::time::Instant;

use crate::protocol::Role;
use crate::session::{ClientInfo, ConnectionHandle, ConnectionId};

use super::entry::ConnectionEntry;
use super::error::RegistryError;

/// Registry of live connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a connection whose handshake completed.
    ///
    /// A second open for the same id replaces the previous entry.
    pub fn open(&mut self, handle: ConnectionHandle, connected_at: Instant, now: Instant) {
        let id = handle.id();
        let entry = ConnectionEntry::open(handle, connected_at, now);

        tracing::debug!(
            conn = %id,
            peer = %entry.state.peer_addr,
            "Connection opened"
        );

        self.connections.insert(id, entry);
    }

    /// Record or overwrite the client info of a connection.
    ///
    /// Returns the previous client info.
    pub fn register(
        &mut self,
        id: ConnectionId,
        role: Role,
        stream_id: impl Into<String>,
    ) -> Result<Option<ClientInfo>, RegistryError> {
        let entry = self
            .connections
            .get_mut(&id)
            .ok_or(RegistryError::ConnectionNotFound(id))?;

        Ok(entry.info.replace(ClientInfo::new(role, stream_id)))
    }

    /// Tag the next data payload of a connection with a stream id
    pub fn prime(&mut self, id: ConnectionId, stream_id: impl Into<String>) -> Result<(), RegistryError> {
        let entry = self
            .connections
            .get_mut(&id)
            .ok_or(RegistryError::ConnectionNotFound(id))?;

        entry.primed_stream = Some(stream_id.into());
        Ok(())
    }

    /// Consume the primed stream id of a connection
    pub fn take_primed(&mut self, id: ConnectionId) -> Option<String> {
        self.connections
            .get_mut(&id)
            .and_then(|entry| entry.primed_stream.take())
    }

    /// Record inbound activity
    pub fn touch(&mut self, id: ConnectionId, now: Instant) {
        if let Some(entry) = self.connections.get_mut(&id) {
            entry.state.touch(now);
        }
    }

    /// Get a connection entry
    pub fn get(&self, id: ConnectionId) -> Option<&ConnectionEntry> {
        self.connections.get(&id)
    }

    /// Get a mutable connection entry
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut ConnectionEntry> {
        self.connections.get_mut(&id)
    }

    /// Stop tracking a connection
    pub fn remove(&mut self, id: ConnectionId) -> Option<ConnectionEntry> {
        self.connections.remove(&id)
    }

    /// Iterate over all tracked connections
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionEntry> {
        self.connections.values()
    }

    /// Number of tracked connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if no connections are tracked
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of open subscribers that receive frames of `stream_id`
    pub fn subscriber_count(&self, stream_id: &str) -> usize {
        self.iter()
            .filter(|entry| entry.state.is_open() && entry.subscribes_to(stream_id))
            .count()
    }

    /// Connections that are tracked but can no longer exchange messages
    pub fn dead_connections(&self) -> Vec<ConnectionId> {
        self.iter()
            .filter(|entry| !entry.is_live())
            .map(|entry| entry.id())
            .collect()
    }
}
