//! Health monitor
//!
//! The only time-driven part of the relay. Each sweep:
//!
//! 1. force-flushes buffers whose oldest frame is older than the tier max-age
//! 2. prunes connections that are no longer open
//! 3. queues a heartbeat ping on every open connection
//! 4. reports the viewer count of each published stream to its streamer and
//!    to multi-viewers
//!
//! Heartbeats only refresh last-activity when a pong arrives; an idle
//! connection is never disconnected on that basis alone.

use std::time::Instant;

use crate::protocol::{Role, StatusMessage};
use crate::session::{ConnectionId, Outbound};
use crate::stats::SweepReport;

use super::broadcaster;
use super::relay::RelayHub;

impl RelayHub {
    /// Run one health monitor sweep
    pub fn tick(&mut self, now: Instant) -> SweepReport {
        let report = SweepReport {
            forced_flushes: self.flush_stale(now),
            pruned: self.prune_dead(),
            heartbeats: self.send_heartbeats(),
            status_messages: self.emit_stream_status(),
        };

        self.stats.record_sweep(&report);

        tracing::debug!(
            connections = self.connections.len(),
            streams = self.directory.len(),
            buffered = self.buffers.buffered_frames(),
            relayed = self.stats.frames_relayed,
            stale = self.stats.frames_stale,
            send_failures = self.stats.send_failures,
            "Monitor sweep"
        );

        report
    }

    fn flush_stale(&mut self, now: Instant) -> usize {
        let stale = self.buffers.stale_streams(now);

        for stream_id in &stale {
            if let Some(latency) = self
                .buffers
                .get(stream_id)
                .and_then(|buffer| buffer.oldest_age(now))
            {
                tracing::warn!(
                    stream = %stream_id,
                    tier = %self.buffers.tier(stream_id).name,
                    latency_ms = latency.as_millis() as u64,
                    "High latency detected, forcing flush"
                );
            }
            self.flush(stream_id, now);
        }

        stale.len()
    }

    fn prune_dead(&mut self) -> usize {
        let dead = self.connections.dead_connections();

        for id in &dead {
            tracing::debug!(conn = %id, "Pruning dead connection");
            self.terminate(*id, false);
        }

        dead.len()
    }

    fn send_heartbeats(&self) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.state.is_open())
            .filter(|entry| entry.handle.send(Outbound::Ping).is_ok())
            .count()
    }

    fn emit_stream_status(&self) -> usize {
        let timestamp = chrono::Utc::now().timestamp_millis();

        let statuses: Vec<(String, ConnectionId, usize)> = self
            .directory
            .iter()
            .map(|(stream_id, owner)| {
                let viewers = self.connections.subscriber_count(stream_id);
                (stream_id.to_string(), owner, viewers)
            })
            .collect();

        let mut sent = 0;
        for (stream_id, owner, active_viewers) in statuses {
            let msg = StatusMessage::StreamStatus {
                stream_id,
                active_viewers,
                timestamp,
            };
            let fanout = broadcaster::broadcast_status(&self.connections, &msg, |entry| {
                entry.id() == owner || entry.role() == Some(Role::MultiViewer)
            });
            sent += fanout.delivered;
        }

        sent
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::sync::mpsc;

    use crate::buffer::BufferedFrame;
    use crate::hub::HubConfig;
    use crate::session::ConnectionHandle;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn connect(hub: &mut RelayHub, id: u64, role: Role, stream: &str, now: Instant) -> mpsc::Receiver<Outbound> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5000);
        let (handle, rx) = ConnectionHandle::channel(ConnectionId(id), addr, 32);
        hub.on_open(handle, now, now);
        hub.register(ConnectionId(id), role, stream.to_string());
        rx
    }

    fn drain(rx: &mut mpsc::Receiver<Outbound>) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn statuses(rx: &mut mpsc::Receiver<Outbound>) -> Vec<(String, usize)> {
        drain(rx)
            .into_iter()
            .filter_map(|msg| match msg {
                Outbound::Text(text) => match serde_json::from_str::<StatusMessage>(&text).ok()? {
                    StatusMessage::StreamStatus {
                        stream_id,
                        active_viewers,
                        ..
                    } => Some((stream_id, active_viewers)),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_stale_buffer_forced_flush() {
        let t0 = Instant::now();
        let mut hub = RelayHub::new(HubConfig::default());
        let _streamer = connect(&mut hub, 1, Role::Streamer, "main", t0);
        let mut viewer = connect(&mut hub, 2, Role::Viewer, "main", t0);

        // Main tier: capacity 5, max-age 100ms; a single frame sits below capacity
        hub.admit("main", BufferedFrame::new(Bytes::from_static(b"f1"), ConnectionId(1), t0), t0);
        hub.admit(
            "main",
            BufferedFrame::new(Bytes::from_static(b"f2"), ConnectionId(1), t0 + ms(80)),
            t0 + ms(80),
        );

        let report = hub.tick(t0 + ms(50));
        assert_eq!(report.forced_flushes, 0);
        assert_eq!(hub.buffers().get("main").unwrap().len(), 2);

        let report = hub.tick(t0 + ms(150));
        assert_eq!(report.forced_flushes, 1);
        assert!(hub.buffers().is_empty());

        let frames: Vec<Outbound> = drain(&mut viewer)
            .into_iter()
            .filter(|msg| matches!(msg, Outbound::Binary(_)))
            .collect();
        assert_eq!(frames, vec![Outbound::Binary(Bytes::from_static(b"f2"))]);
        assert_eq!(hub.stats().frames_stale, 1);
        assert_eq!(hub.stats().forced_flushes, 1);
    }

    #[test]
    fn test_prunes_dead_connections() {
        let t0 = Instant::now();
        let mut hub = RelayHub::new(HubConfig::default());
        let mut multi = connect(&mut hub, 1, Role::MultiViewer, "all", t0);
        let streamer = connect(&mut hub, 2, Role::Streamer, "cam1", t0);
        drain(&mut multi);

        drop(streamer);
        let report = hub.tick(t0);

        assert_eq!(report.pruned, 1);
        assert!(hub.connections().get(ConnectionId(2)).is_none());
        assert!(hub.active_streams().is_empty());

        let streams_messages = drain(&mut multi)
            .into_iter()
            .filter(|msg| matches!(msg, Outbound::Text(t) if t.contains("active-streams")))
            .count();
        assert_eq!(streams_messages, 1);
    }

    #[test]
    fn test_heartbeats_queued() {
        let t0 = Instant::now();
        let mut hub = RelayHub::new(HubConfig::default());
        let mut viewer = connect(&mut hub, 1, Role::Viewer, "cam1", t0);

        let report = hub.tick(t0);

        assert_eq!(report.heartbeats, 1);
        assert_eq!(drain(&mut viewer), vec![Outbound::Ping]);
    }

    #[test]
    fn test_idle_connection_not_disconnected() {
        let t0 = Instant::now();
        let mut hub = RelayHub::new(HubConfig::default());
        let _viewer = connect(&mut hub, 1, Role::Viewer, "cam1", t0);

        let report = hub.tick(t0 + Duration::from_secs(3600));

        assert_eq!(report.pruned, 0);
        assert!(hub.connections().get(ConnectionId(1)).is_some());
    }

    #[test]
    fn test_stream_status_counts() {
        let t0 = Instant::now();
        let mut hub = RelayHub::new(HubConfig::default());
        let mut streamer = connect(&mut hub, 1, Role::Streamer, "cam1", t0);
        let mut multi = connect(&mut hub, 2, Role::MultiViewer, "all", t0);
        let mut viewer = connect(&mut hub, 3, Role::Viewer, "cam1", t0);
        let _other = connect(&mut hub, 4, Role::Viewer, "cam2", t0);
        drain(&mut multi);

        let report = hub.tick(t0);

        assert_eq!(report.status_messages, 2);
        assert_eq!(statuses(&mut streamer), vec![("cam1".to_string(), 2)]);
        assert_eq!(statuses(&mut multi), vec![("cam1".to_string(), 2)]);
        assert!(statuses(&mut viewer).is_empty());
    }
}
