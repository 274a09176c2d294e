//! Hub configuration

use std::time::Duration;

use bytes::Bytes;

use crate::buffer::TierTable;

/// Shortest accepted health monitor period
pub const MIN_MONITOR_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the relay hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Buffering tier per stream id
    pub tiers: TierTable,

    /// Bytes prepended to every relayed frame (e.g. a data URL prefix)
    pub frame_prefix: Option<Bytes>,

    /// Health monitor period
    pub monitor_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            tiers: TierTable::default(),
            frame_prefix: None,
            monitor_interval: Duration::from_millis(1000),
        }
    }
}

impl HubConfig {
    /// Replace the tier table
    pub fn tiers(mut self, tiers: TierTable) -> Self {
        self.tiers = tiers;
        self
    }

    /// Prepend a fixed prefix to relayed frames
    pub fn frame_prefix(mut self, prefix: impl Into<Bytes>) -> Self {
        self.frame_prefix = Some(prefix.into());
        self
    }

    /// Set the health monitor period; at least [`MIN_MONITOR_INTERVAL`]
    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval.max(MIN_MONITOR_INTERVAL);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Tier;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();

        assert_eq!(config.monitor_interval, Duration::from_millis(1000));
        assert!(config.frame_prefix.is_none());
        assert_eq!(config.tiers.lookup("main").capacity, 5);
    }

    #[test]
    fn test_builder_chaining() {
        let config = HubConfig::default()
            .tiers(TierTable::new(Tier::new("only", 1, Duration::from_millis(10), 0)))
            .frame_prefix("data:image/jpeg;base64,")
            .monitor_interval(Duration::from_millis(250));

        assert_eq!(config.tiers.lookup("main").name, "only");
        assert_eq!(
            config.frame_prefix.as_deref(),
            Some(&b"data:image/jpeg;base64,"[..])
        );
        assert_eq!(config.monitor_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_monitor_interval_clamped() {
        let config = HubConfig::default().monitor_interval(Duration::ZERO);

        assert_eq!(config.monitor_interval, MIN_MONITOR_INTERVAL);
    }
}
