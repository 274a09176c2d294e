//! Relay hub
//!
//! The hub owns every piece of mutable relay state and is driven by a single
//! task: connection events and monitor ticks run to completion one at a time,
//! so admit and flush for a stream never interleave and no locks are needed.

use std::time::Instant;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::buffer::{BufferedFrame, Flush, FrameBuffers};
use crate::protocol::{split_header, with_prefix, ControlMessage, Inbound, Role, StatusMessage, WILDCARD_STREAM};
use crate::registry::{ConnectionRegistry, StreamDirectory};
use crate::session::{ConnectionHandle, ConnectionId};
use crate::stats::{FanOut, RelayStats};

use super::broadcaster;
use super::config::{HubConfig, MIN_MONITOR_INTERVAL};
use super::event::HubEvent;

/// Relay server context
pub struct RelayHub {
    pub(super) config: HubConfig,
    pub(super) connections: ConnectionRegistry,
    pub(super) directory: StreamDirectory,
    pub(super) buffers: FrameBuffers,
    pub(super) stats: RelayStats,
}

impl RelayHub {
    /// Create a hub with the given configuration
    pub fn new(config: HubConfig) -> Self {
        let buffers = FrameBuffers::new(config.tiers.clone());

        Self {
            config,
            connections: ConnectionRegistry::new(),
            directory: StreamDirectory::new(),
            buffers,
            stats: RelayStats::new(),
        }
    }

    /// Hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Live connections
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Published streams
    pub fn directory(&self) -> &StreamDirectory {
        &self.directory
    }

    /// Pending frame buffers
    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    /// Counters
    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Currently published stream ids
    pub fn active_streams(&self) -> Vec<String> {
        self.directory.list()
    }

    /// Apply one connection event
    pub fn handle_event(&mut self, event: HubEvent, now: Instant) {
        match event {
            HubEvent::Opened {
                handle,
                connected_at,
            } => self.on_open(handle, connected_at, now),
            HubEvent::Message { id, payload } => self.dispatch(id, payload, now),
            HubEvent::Heartbeat { id } => self.connections.touch(id, now),
            HubEvent::Closing { id } => {
                if let Some(entry) = self.connections.get_mut(id) {
                    entry.state.begin_close();
                }
            }
            HubEvent::Closed { id } => self.on_close(id),
            HubEvent::Errored { id, cause } => self.on_error(id, &cause),
        }
    }

    /// Track a connection whose handshake completed
    pub fn on_open(&mut self, handle: ConnectionHandle, connected_at: Instant, now: Instant) {
        self.stats.total_connections += 1;
        self.connections.open(handle, connected_at, now);
    }

    /// Classify and route one inbound payload
    pub fn dispatch(&mut self, id: ConnectionId, payload: Bytes, now: Instant) {
        if self.connections.get(id).is_none() {
            tracing::debug!(conn = %id, "Message from untracked connection");
            return;
        }
        self.connections.touch(id, now);

        match Inbound::decode(payload) {
            Inbound::Control(ControlMessage::Register { role, stream_id }) => {
                self.register(id, role, stream_id);
            }
            Inbound::Control(ControlMessage::Frame { stream_id }) => {
                // Registry presence was checked above
                let _ = self.connections.prime(id, stream_id);
            }
            Inbound::Data(data) => self.on_data(id, data, now),
        }
    }

    /// Record or overwrite a connection's role and stream.
    ///
    /// A streamer publishes its stream id; a streamer that re-registers as
    /// something else (or for another id) unpublishes what it owned.
    pub fn register(&mut self, id: ConnectionId, role: Role, stream_id: String) {
        let previous = match self.connections.register(id, role, stream_id.clone()) {
            Ok(previous) => previous,
            Err(e) => {
                tracing::debug!(error = %e, "Register ignored");
                return;
            }
        };

        tracing::info!(conn = %id, role = %role, stream = %stream_id, "Client registered");

        let mut changed = false;
        if let Some(prev) = previous {
            let same_stream = role == Role::Streamer && prev.stream_id == stream_id;
            if prev.role == Role::Streamer && !same_stream {
                changed |= self.directory.unpublish(&prev.stream_id, id);
            }
        }

        if role == Role::Streamer {
            if stream_id == WILDCARD_STREAM {
                tracing::warn!(conn = %id, "Streamer cannot publish the wildcard stream");
            } else {
                changed |= self.directory.publish(&stream_id, id);
            }
        }

        if changed {
            self.broadcast_active_streams();
        } else if role == Role::MultiViewer {
            self.send_active_streams(id);
        }
    }

    /// Buffer a data payload from a streamer
    fn on_data(&mut self, id: ConnectionId, payload: Bytes, now: Instant) {
        self.stats.frames_received += 1;

        let (embedded, payload) = split_header(payload);
        let primed = self.connections.take_primed(id);

        let registered = self
            .connections
            .get(id)
            .and_then(|entry| entry.info.as_ref())
            .filter(|info| info.role == Role::Streamer)
            .map(|info| info.stream_id.clone());

        let Some(registered) = registered else {
            self.stats.frames_rejected += 1;
            tracing::debug!(conn = %id, "Dropping data from non-streamer");
            return;
        };

        let stream_id = embedded.or(primed).unwrap_or(registered);
        if stream_id == WILDCARD_STREAM {
            self.stats.frames_rejected += 1;
            tracing::debug!(conn = %id, "Dropping frame without a concrete stream id");
            return;
        }

        self.admit(&stream_id, BufferedFrame::new(payload, id, now), now);
    }

    /// Buffer a frame, relaying immediately if the buffer fills
    pub fn admit(&mut self, stream_id: &str, frame: BufferedFrame, now: Instant) {
        if let Some(flush) = self.buffers.admit(stream_id, frame, now) {
            self.relay(stream_id, flush);
        }
    }

    /// Flush a stream's buffer now
    pub fn flush(&mut self, stream_id: &str, now: Instant) {
        if let Some(flush) = self.buffers.flush(stream_id, now) {
            self.relay(stream_id, flush);
        }
    }

    pub(super) fn relay(&mut self, stream_id: &str, flush: Flush) {
        self.stats.record_flush(&flush);

        if flush.stale > 0 {
            tracing::debug!(stream = stream_id, stale = flush.stale, "Discarded stale frames");
        }

        if let Some(frame) = flush.frame {
            let payload = with_prefix(self.config.frame_prefix.as_ref(), frame.payload);
            self.broadcast(stream_id, frame.origin, payload);
        }
    }

    /// Fan a frame out to the subscribers of `stream_id`
    pub fn broadcast(&mut self, stream_id: &str, origin: ConnectionId, payload: Bytes) -> FanOut {
        let fanout = broadcaster::broadcast_frame(&self.connections, stream_id, origin, &payload);
        self.stats.record_fanout(&fanout);
        fanout
    }

    /// Connection closed cleanly
    pub fn on_close(&mut self, id: ConnectionId) {
        self.terminate(id, false);
    }

    /// Connection failed
    pub fn on_error(&mut self, id: ConnectionId, cause: &str) {
        tracing::warn!(conn = %id, cause = cause, "Connection error");
        self.terminate(id, true);
    }

    /// Move a connection to a terminal phase and clean up once.
    ///
    /// Repeated signals for a removed connection are no-ops.
    pub(super) fn terminate(&mut self, id: ConnectionId, errored: bool) {
        let Some(entry) = self.connections.get_mut(id) else {
            return;
        };

        let terminated = if errored {
            entry.state.fail()
        } else {
            entry.state.begin_close();
            entry.state.finish_close()
        };
        if !terminated {
            return;
        }

        let Some(entry) = self.connections.remove(id) else {
            return;
        };

        tracing::info!(
            conn = %id,
            phase = ?entry.state.phase,
            role = ?entry.role(),
            "Client disconnected"
        );

        if let Some(info) = entry.info {
            if info.role == Role::Streamer && self.directory.unpublish(&info.stream_id, id) {
                self.broadcast_active_streams();
            }
        }
    }

    /// Send the stream list to every multi-viewer
    pub(super) fn broadcast_active_streams(&self) -> FanOut {
        let msg = StatusMessage::ActiveStreams {
            streams: self.directory.list(),
        };

        broadcaster::broadcast_status(&self.connections, &msg, |entry| {
            entry.role() == Some(Role::MultiViewer)
        })
    }

    fn send_active_streams(&self, id: ConnectionId) {
        let msg = StatusMessage::ActiveStreams {
            streams: self.directory.list(),
        };

        broadcaster::broadcast_status(&self.connections, &msg, |entry| entry.id() == id);
    }

    /// Spawn the hub task.
    ///
    /// Returns the event sender used by connection tasks and the task handle.
    pub fn spawn(self, capacity: usize) -> (mpsc::Sender<HubEvent>, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(self.run(rx));
        (tx, task)
    }

    /// Process events and monitor ticks until every event sender is dropped
    pub async fn run(mut self, mut events: mpsc::Receiver<HubEvent>) {
        // A directly assigned field skips the builder's floor
        let period = self.config.monitor_interval.max(MIN_MONITOR_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(
            interval_ms = period.as_millis() as u64,
            "Relay hub started"
        );

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, Instant::now()),
                    None => break,
                },
                _ = ticker.tick() => {
                    self.tick(Instant::now());
                }
            }
        }

        tracing::info!(connections = self.connections.len(), "Relay hub stopped");
    }
}
