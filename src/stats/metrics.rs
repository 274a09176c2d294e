//! Statistics for the relay hub

use crate::buffer::Flush;

/// Per-recipient outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Recipients whose queue accepted the message
    pub delivered: usize,
    /// Recipients whose queue was full or closed
    pub failed: usize,
}

/// Outcome of one health monitor sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Buffers flushed because their oldest frame was stale
    pub forced_flushes: usize,
    /// Dead connections removed
    pub pruned: usize,
    /// Heartbeat pings queued
    pub heartbeats: usize,
    /// `streamStatus` messages queued
    pub status_messages: usize,
}

/// Hub-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Connections ever opened
    pub total_connections: u64,
    /// Data payloads received
    pub frames_received: u64,
    /// Data payloads dropped before buffering (no streamer, no stream id)
    pub frames_rejected: u64,
    /// Flushes that selected a frame
    pub frames_relayed: u64,
    /// Buffered frames discarded for exceeding max-age
    pub frames_stale: u64,
    /// Fresh frames discarded in favour of a newer one
    pub frames_superseded: u64,
    /// Frames queued to subscribers
    pub deliveries: u64,
    /// Failed sends to subscribers
    pub send_failures: u64,
    /// Flushes forced by the health monitor
    pub forced_flushes: u64,
    /// Dead connections pruned by the health monitor
    pub pruned_connections: u64,
}

impl RelayStats {
    /// Create zeroed stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a buffer flush
    pub fn record_flush(&mut self, flush: &Flush) {
        if flush.frame.is_some() {
            self.frames_relayed += 1;
        }
        self.frames_stale += flush.stale as u64;
        self.frames_superseded += flush.superseded as u64;
    }

    /// Account for a frame fan-out
    pub fn record_fanout(&mut self, fanout: &FanOut) {
        self.deliveries += fanout.delivered as u64;
        self.send_failures += fanout.failed as u64;
    }

    /// Account for a monitor sweep
    pub fn record_sweep(&mut self, report: &SweepReport) {
        self.forced_flushes += report.forced_flushes as u64;
        self.pruned_connections += report.pruned as u64;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use bytes::Bytes;

    use super::*;
    use crate::buffer::BufferedFrame;
    use crate::session::ConnectionId;

    #[test]
    fn test_relay_stats_new() {
        let stats = RelayStats::new();
        assert_eq!(stats.frames_received, 0);
        assert_eq!(stats.frames_relayed, 0);
        assert_eq!(stats.deliveries, 0);
        assert_eq!(stats.send_failures, 0);
    }

    #[test]
    fn test_record_flush() {
        let mut stats = RelayStats::new();
        let frame = BufferedFrame::new(Bytes::from_static(b"x"), ConnectionId(1), Instant::now());

        stats.record_flush(&Flush {
            frame: Some(frame),
            stale: 2,
            superseded: 1,
        });
        stats.record_flush(&Flush {
            frame: None,
            stale: 3,
            superseded: 0,
        });

        assert_eq!(stats.frames_relayed, 1);
        assert_eq!(stats.frames_stale, 5);
        assert_eq!(stats.frames_superseded, 1);
    }

    #[test]
    fn test_record_fanout_and_sweep() {
        let mut stats = RelayStats::new();
        stats.record_fanout(&FanOut {
            delivered: 2,
            failed: 1,
        });
        stats.record_sweep(&SweepReport {
            forced_flushes: 1,
            pruned: 2,
            heartbeats: 4,
            status_messages: 0,
        });

        assert_eq!(stats.deliveries, 2);
        assert_eq!(stats.send_failures, 1);
        assert_eq!(stats.forced_flushes, 1);
        assert_eq!(stats.pruned_connections, 2);
    }
}
