//! Relay statistics

pub mod metrics;

pub use metrics::{FanOut, RelayStats, SweepReport};
