//! Per-connection WebSocket task
//!
//! Performs the handshake, then runs a reader and a writer side by side. The
//! reader turns WebSocket messages into hub events; the writer drains the
//! connection's outbound queue. Whichever side finishes first ends the
//! connection, and the hub is told exactly how it ended.

use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::{Error, Result};
use crate::hub::HubEvent;
use crate::server::config::ServerConfig;
use crate::session::{ConnectionHandle, ConnectionId, Outbound};

type WsStream = WebSocketStream<TcpStream>;

/// Drive one connection from handshake to close
pub(crate) async fn serve(
    id: ConnectionId,
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: &ServerConfig,
    events: mpsc::Sender<HubEvent>,
) -> Result<()> {
    let connected_at = Instant::now();

    let ws = tokio::time::timeout(config.handshake_timeout, tokio_tungstenite::accept_async(socket))
        .await
        .map_err(|_| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "WebSocket handshake timed out",
            ))
        })??;

    let (handle, outbound) =
        ConnectionHandle::channel(id, peer_addr, config.outbound_queue_capacity);
    events
        .send(HubEvent::Opened {
            handle,
            connected_at,
        })
        .await
        .map_err(|_| Error::HubStopped)?;

    let (sink, stream) = ws.split();

    let result = tokio::select! {
        result = read_loop(id, stream, &events) => result,
        result = write_loop(sink, outbound) => result,
    };

    let event = match &result {
        Ok(()) => HubEvent::Closed { id },
        Err(e) => HubEvent::Errored {
            id,
            cause: e.to_string(),
        },
    };
    // The hub may already be gone during shutdown
    let _ = events.send(event).await;

    result
}

async fn read_loop(
    id: ConnectionId,
    mut stream: SplitStream<WsStream>,
    events: &mpsc::Sender<HubEvent>,
) -> Result<()> {
    while let Some(msg) = stream.next().await {
        let event = match msg? {
            Message::Text(text) => HubEvent::Message {
                id,
                payload: Bytes::from(text),
            },
            Message::Binary(data) => HubEvent::Message {
                id,
                payload: Bytes::from(data),
            },
            Message::Pong(_) => HubEvent::Heartbeat { id },
            // Keep polling so tungstenite flushes the close reply; the
            // stream ends once the close handshake completes
            Message::Close(_) => HubEvent::Closing { id },
            // Pings are answered by tungstenite
            Message::Ping(_) | Message::Frame(_) => continue,
        };

        events.send(event).await.map_err(|_| Error::HubStopped)?;
    }

    Ok(())
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
) -> Result<()> {
    while let Some(msg) = outbound.recv().await {
        let msg = match msg {
            Outbound::Text(text) => Message::Text(text),
            Outbound::Binary(data) => Message::Binary(data.to_vec()),
            Outbound::Ping => Message::Ping(Vec::new()),
        };
        sink.send(msg).await?;
    }

    // The hub dropped this connection
    let _ = sink.send(Message::Close(None)).await;
    Ok(())
}
