use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cadences and tuning constants of the sync engine.
///
/// The intervals are tuning values, not protocol contracts. The poll and probe
/// timers are independent of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Message poll cadence while the panel is open
    pub poll_interval_ms: u64,
    /// Unread probe cadence while the panel is closed
    pub probe_interval_ms: u64,
    /// One-off probe after start
    pub initial_probe_delay_ms: u64,
    /// Delay between opening the panel and sending mark-read
    pub mark_read_delay_ms: u64,
    /// Delay before the admin console reloads after a reply
    pub admin_reload_delay_ms: u64,
    /// Target language of the translation overlay
    pub target_language: String,
    /// Capacity of the widget event channel
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 4_000,
            probe_interval_ms: 15_000,
            initial_probe_delay_ms: 2_000,
            mark_read_delay_ms: 1_000,
            admin_reload_delay_ms: 500,
            target_language: "en".to_string(),
            event_buffer: 256,
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_initial_probe_delay(mut self, delay: Duration) -> Self {
        self.initial_probe_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_mark_read_delay(mut self, delay: Duration) -> Self {
        self.mark_read_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = language.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.max(1))
    }

    pub fn initial_probe_delay(&self) -> Duration {
        Duration::from_millis(self.initial_probe_delay_ms)
    }

    pub fn mark_read_delay(&self) -> Duration {
        Duration::from_millis(self.mark_read_delay_ms)
    }

    pub fn admin_reload_delay(&self) -> Duration {
        Duration::from_millis(self.admin_reload_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(4));
        assert_eq!(config.probe_interval(), Duration::from_secs(15));
        assert_eq!(config.target_language, "en");
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{"poll_interval_ms": 1000}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.probe_interval_ms, 15_000);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = SyncConfig::new().with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }
}
