//! Per-stream frame buffers
//!
//! Frames wait in a small FIFO until either the tier's capacity is reached or
//! the health monitor finds the oldest frame stale. A flush delivers only the
//! newest fresh frame and discards everything else: the relay favours
//! recency over completeness and never queues a backlog.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::session::ConnectionId;

use super::tier::{Tier, TierTable};

/// A frame waiting to be flushed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedFrame {
    /// Frame bytes
    pub payload: Bytes,
    /// Admission time
    pub enqueued_at: Instant,
    /// Connection that published the frame
    pub origin: ConnectionId,
}

impl BufferedFrame {
    /// Create a buffered frame
    pub fn new(payload: Bytes, origin: ConnectionId, enqueued_at: Instant) -> Self {
        Self {
            payload,
            enqueued_at,
            origin,
        }
    }

    /// Time spent in the buffer
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}

/// Result of flushing one buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flush {
    /// Newest fresh frame, if any
    pub frame: Option<BufferedFrame>,
    /// Frames older than the tier's max-age
    pub stale: usize,
    /// Fresh frames dropped in favour of a newer one
    pub superseded: usize,
}

/// Bounded, time-windowed FIFO for one stream
#[derive(Debug)]
pub struct FrameBuffer {
    tier: Tier,
    frames: VecDeque<BufferedFrame>,
}

impl FrameBuffer {
    /// Create an empty buffer for a tier
    pub fn new(tier: Tier) -> Self {
        let frames = VecDeque::with_capacity(tier.capacity);
        Self { tier, frames }
    }

    /// Buffering policy of this stream
    pub fn tier(&self) -> &Tier {
        &self.tier
    }

    /// Append a frame.
    ///
    /// Flushes immediately when the buffer reaches the tier's capacity.
    pub fn admit(&mut self, frame: BufferedFrame, now: Instant) -> Option<Flush> {
        self.frames.push_back(frame);

        if self.frames.len() >= self.tier.capacity {
            Some(self.flush(now))
        } else {
            None
        }
    }

    /// Select the newest fresh frame and clear the buffer
    pub fn flush(&mut self, now: Instant) -> Flush {
        let max_age = self.tier.max_age;
        let fresh = self
            .frames
            .iter()
            .filter(|frame| frame.age(now) <= max_age)
            .count();
        let stale = self.frames.len() - fresh;

        let frame = self
            .frames
            .drain(..)
            .rev()
            .find(|frame| frame.age(now) <= max_age);

        Flush {
            frame,
            stale,
            superseded: fresh.saturating_sub(1),
        }
    }

    /// Age of the oldest buffered frame
    pub fn oldest_age(&self, now: Instant) -> Option<Duration> {
        self.frames.front().map(|frame| frame.age(now))
    }

    /// Whether the oldest frame has exceeded the tier's max-age
    pub fn is_stale(&self, now: Instant) -> bool {
        self.oldest_age(now)
            .is_some_and(|age| age > self.tier.max_age)
    }

    /// Number of buffered frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Frame buffers of all streams, keyed by stream id.
///
/// A buffer exists only while it holds frames.
#[derive(Debug)]
pub struct FrameBuffers {
    tiers: TierTable,
    buffers: HashMap<String, FrameBuffer>,
}

impl FrameBuffers {
    /// Create with a tier table
    pub fn new(tiers: TierTable) -> Self {
        Self {
            tiers,
            buffers: HashMap::new(),
        }
    }

    /// Tier of a stream
    pub fn tier(&self, stream_id: &str) -> &Tier {
        self.tiers.lookup(stream_id)
    }

    /// Buffer a frame for a stream; returns the flush it triggered, if any
    pub fn admit(&mut self, stream_id: &str, frame: BufferedFrame, now: Instant) -> Option<Flush> {
        let tiers = &self.tiers;
        let buffer = self
            .buffers
            .entry(stream_id.to_string())
            .or_insert_with(|| FrameBuffer::new(tiers.lookup(stream_id).clone()));

        let flush = buffer.admit(frame, now);
        if flush.is_some() {
            self.buffers.remove(stream_id);
        }
        flush
    }

    /// Flush a stream's buffer; `None` if nothing is buffered
    pub fn flush(&mut self, stream_id: &str, now: Instant) -> Option<Flush> {
        let mut buffer = self.buffers.remove(stream_id)?;
        Some(buffer.flush(now))
    }

    /// Streams whose oldest frame is stale, highest priority tier first
    pub fn stale_streams(&self, now: Instant) -> Vec<String> {
        let mut stale: Vec<(&Tier, &String)> = self
            .buffers
            .iter()
            .filter(|(_, buffer)| buffer.is_stale(now))
            .map(|(id, buffer)| (buffer.tier(), id))
            .collect();

        stale.sort_by(|a, b| a.0.priority.cmp(&b.0.priority).then_with(|| a.1.cmp(b.1)));
        stale.into_iter().map(|(_, id)| id.clone()).collect()
    }

    /// Get a stream's buffer
    pub fn get(&self, stream_id: &str) -> Option<&FrameBuffer> {
        self.buffers.get(stream_id)
    }

    /// Total frames buffered across all streams
    pub fn buffered_frames(&self) -> usize {
        self.buffers.values().map(FrameBuffer::len).sum()
    }

    /// Number of streams with buffered frames
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
