//! Outbound connection handle
//!
//! The hub never touches a socket. Each connection's writer task owns the
//! WebSocket sink and drains a bounded queue fed through [`ConnectionHandle`].

use std::net::SocketAddr;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Unique connection identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Message queued for a connection's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// JSON status message
    Text(String),
    /// Relayed frame
    Binary(Bytes),
    /// Heartbeat
    Ping,
}

/// A write that could not be queued
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// Writer is behind; the message was dropped
    #[error("outbound queue full")]
    Full,
    /// Writer task is gone
    #[error("connection closed")]
    Closed,
}

/// Sending half of a connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    peer_addr: SocketAddr,
    tx: mpsc::Sender<Outbound>,
}

impl ConnectionHandle {
    /// Wrap an existing outbound queue
    pub fn new(id: ConnectionId, peer_addr: SocketAddr, tx: mpsc::Sender<Outbound>) -> Self {
        Self { id, peer_addr, tx }
    }

    /// Create a handle together with the receiving end of its queue
    pub fn channel(
        id: ConnectionId,
        peer_addr: SocketAddr,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(id, peer_addr, tx), rx)
    }

    /// Connection identity
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Queue a message without waiting
    pub fn send(&self, msg: Outbound) -> Result<(), SendError> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Whether the writer task has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5000)
    }

    #[test]
    fn test_send_and_receive() {
        let (handle, mut rx) = ConnectionHandle::channel(ConnectionId(7), addr(), 4);
        handle.send(Outbound::Ping).unwrap();

        assert_eq!(rx.try_recv().unwrap(), Outbound::Ping);
        assert_eq!(handle.id().to_string(), "conn-7");
    }

    #[test]
    fn test_send_full() {
        let (handle, _rx) = ConnectionHandle::channel(ConnectionId(1), addr(), 1);
        handle.send(Outbound::Ping).unwrap();

        assert_eq!(handle.send(Outbound::Ping), Err(SendError::Full));
    }

    #[test]
    fn test_send_closed() {
        let (handle, rx) = ConnectionHandle::channel(ConnectionId(1), addr(), 1);
        drop(rx);

        assert!(handle.is_closed());
        assert_eq!(handle.send(Outbound::Ping), Err(SendError::Closed));
    }
}
