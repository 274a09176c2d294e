//! Buffering tiers
//!
//! A tier bundles the flush threshold and staleness window of a stream. Tiers
//! are chosen by exact match on well-known stream ids, falling back to a
//! default tier for everything else.

use std::collections::HashMap;
use std::time::Duration;

/// Stream id of the primary camera
pub const MAIN_STREAM: &str = "main";

/// Stream id of the depth camera
pub const DEPTH_STREAM: &str = "depth";

/// Buffering policy for one class of stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    /// Tier name (for logs)
    pub name: String,
    /// Buffered frame count that forces a flush
    pub capacity: usize,
    /// Maximum time a frame may wait before it is stale
    pub max_age: Duration,
    /// Sweep order, lower first
    pub priority: u8,
}

impl Tier {
    /// Create a tier; capacity is at least 1
    pub fn new(name: impl Into<String>, capacity: usize, max_age: Duration, priority: u8) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(1),
            max_age,
            priority,
        }
    }

    /// Low-latency tier for the main camera
    pub fn main() -> Self {
        Self::new("main", 5, Duration::from_millis(100), 1)
    }

    /// Medium tier for the depth camera
    pub fn depth() -> Self {
        Self::new("depth", 3, Duration::from_millis(200), 2)
    }

    /// Fallback tier
    pub fn fallback() -> Self {
        Self::new("default", 2, Duration::from_millis(300), 3)
    }
}

/// Stream id to tier lookup
#[derive(Debug, Clone)]
pub struct TierTable {
    exact: HashMap<String, Tier>,
    fallback: Tier,
}

impl TierTable {
    /// Create a table with only a fallback tier
    pub fn new(fallback: Tier) -> Self {
        Self {
            exact: HashMap::new(),
            fallback,
        }
    }

    /// Assign a tier to an exact stream id
    pub fn with_stream(mut self, stream_id: impl Into<String>, tier: Tier) -> Self {
        self.exact.insert(stream_id.into(), tier);
        self
    }

    /// Tier for a stream id
    pub fn lookup(&self, stream_id: &str) -> &Tier {
        self.exact.get(stream_id).unwrap_or(&self.fallback)
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::new(Tier::fallback())
            .with_stream(MAIN_STREAM, Tier::main())
            .with_stream(DEPTH_STREAM, Tier::depth())
    }
}
