//! Directory of published streams
//!
//! Each published stream id is owned by the streamer connection that most
//! recently registered for it. Only the owner can unpublish it, so a
//! superseded streamer closing does not take the stream down.

use std::collections::BTreeMap;

use crate::session::ConnectionId;

/// Set of currently published stream ids
#[derive(Debug, Default)]
pub struct StreamDirectory {
    streams: BTreeMap<String, ConnectionId>,
}

impl StreamDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a stream, taking over ownership if it is already published.
    ///
    /// Returns `true` if the set of published ids changed.
    pub fn publish(&mut self, stream_id: &str, owner: ConnectionId) -> bool {
        match self.streams.insert(stream_id.to_string(), owner) {
            None => true,
            Some(previous) => {
                if previous != owner {
                    tracing::info!(
                        stream = stream_id,
                        previous = %previous,
                        owner = %owner,
                        "Stream taken over by newer streamer"
                    );
                }
                false
            }
        }
    }

    /// Unpublish a stream owned by `owner`.
    ///
    /// Returns `true` if the stream was removed; a non-owner is ignored.
    pub fn unpublish(&mut self, stream_id: &str, owner: ConnectionId) -> bool {
        if self.streams.get(stream_id) != Some(&owner) {
            return false;
        }
        self.streams.remove(stream_id);
        true
    }

    /// Current owner of a stream
    pub fn owner(&self, stream_id: &str) -> Option<ConnectionId> {
        self.streams.get(stream_id).copied()
    }

    /// Check if a stream is published
    pub fn contains(&self, stream_id: &str) -> bool {
        self.streams.contains_key(stream_id)
    }

    /// Published stream ids in lexical order
    pub fn list(&self) -> Vec<String> {
        self.streams.keys().cloned().collect()
    }

    /// Published streams with their owners
    pub fn iter(&self) -> impl Iterator<Item = (&str, ConnectionId)> {
        self.streams.iter().map(|(id, owner)| (id.as_str(), *owner))
    }

    /// Number of published streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Check if nothing is published
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
