//! End-to-end relay tests over real WebSocket connections

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use frame_relay::protocol::{ControlMessage, Role, StatusMessage};
use frame_relay::{HubConfig, RelayServer, ServerConfig};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn start(config: ServerConfig) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<frame_relay::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let hub_config = HubConfig::default().monitor_interval(Duration::from_millis(50));
    let server = RelayServer::with_hub_config(config.bind(addr), hub_config);
    let task = tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    (addr, shutdown_tx, task)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    ws
}

async fn register(ws: &mut Client, role: Role, stream: &str) {
    let msg = ControlMessage::register(role, stream).to_json().unwrap();
    ws.send(Message::Text(msg)).await.unwrap();
}

/// Wait for a status message accepted by `pred`, skipping everything else
async fn next_status<F>(ws: &mut Client, pred: F) -> StatusMessage
where
    F: Fn(&StatusMessage) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let msg = ws.next().await.unwrap().unwrap();
            if let Message::Text(text) = msg {
                let status: StatusMessage = serde_json::from_str(&text).unwrap();
                if pred(&status) {
                    return status;
                }
            }
        }
    })
    .await
    .unwrap()
}

async fn next_binary(ws: &mut Client) -> Vec<u8> {
    tokio::time::timeout(WAIT, async {
        loop {
            if let Message::Binary(data) = ws.next().await.unwrap().unwrap() {
                return data;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_relay_end_to_end() {
    let (addr, shutdown, task) = start(ServerConfig::default()).await;

    let mut viewer = connect(addr).await;
    register(&mut viewer, Role::Viewer, "cam1").await;
    let mut other = connect(addr).await;
    register(&mut other, Role::Viewer, "cam2").await;
    let mut multi = connect(addr).await;
    register(&mut multi, Role::MultiViewer, "all").await;
    next_status(&mut multi, |s| matches!(s, StatusMessage::ActiveStreams { .. })).await;

    let mut streamer = connect(addr).await;
    register(&mut streamer, Role::Streamer, "cam1").await;

    let listed = next_status(&mut multi, |s| {
        matches!(s, StatusMessage::ActiveStreams { streams } if !streams.is_empty())
    })
    .await;
    assert_eq!(
        listed,
        StatusMessage::ActiveStreams {
            streams: vec!["cam1".to_string()]
        }
    );

    // Both subscribers of cam1 (exact and wildcard) are registered once the
    // monitor reports them to the streamer
    next_status(&mut streamer, |s| {
        matches!(s, StatusMessage::StreamStatus { active_viewers: 2, .. })
    })
    .await;

    // Default tier flushes on the second frame and relays only the newest
    for payload in [&b"\xff\xd8frame-1"[..], &b"\xff\xd8frame-2"[..]] {
        let prime = ControlMessage::frame("cam1").to_json().unwrap();
        streamer.send(Message::Text(prime)).await.unwrap();
        streamer.send(Message::Binary(payload.to_vec())).await.unwrap();
    }

    assert_eq!(next_binary(&mut viewer).await, b"\xff\xd8frame-2".to_vec());
    assert_eq!(next_binary(&mut multi).await, b"\xff\xd8frame-2".to_vec());

    streamer.close(None).await.unwrap();
    let listed = next_status(&mut multi, |s| matches!(s, StatusMessage::ActiveStreams { .. })).await;
    assert_eq!(listed, StatusMessage::ActiveStreams { streams: vec![] });

    // cam2 viewer never saw a frame
    let nothing = tokio::time::timeout(Duration::from_millis(200), async {
        loop {
            match other.next().await {
                Some(Ok(Message::Binary(data))) => return data,
                Some(Ok(_)) => continue,
                _ => std::future::pending::<()>().await,
            }
        }
    })
    .await;
    assert!(nothing.is_err());

    shutdown.send(()).unwrap();
    tokio_test::assert_ok!(task.await.unwrap());
}

#[tokio::test]
async fn test_connection_limit() {
    let (addr, shutdown, task) = start(ServerConfig::default().max_connections(1)).await;

    let _first = connect(addr).await;
    let second = connect_async(format!("ws://{addr}")).await;
    tokio_test::assert_err!(second);

    shutdown.send(()).unwrap();
    tokio_test::assert_ok!(task.await.unwrap());
}
