//! Scheduler configuration

use crate::time::CallRate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the tick loop. Threaded systems carry their own rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Target ticks per second; `None` runs ticks back to back, yielding in
    /// between.
    pub frame_rate: Option<CallRate>,
    /// Stop after this many ticks (0 = unlimited).
    pub max_ticks: u64,
    /// Number of recent ticks the reported frame time averages over.
    pub frame_samples: usize,
}

impl SchedulerConfig {
    /// Unpaced loop; mostly useful for tests and benchmarks.
    pub fn unpaced() -> Self {
        Self {
            frame_rate: None,
            ..Self::default()
        }
    }

    pub fn with_frame_rate(mut self, rate: CallRate) -> Self {
        self.frame_rate = Some(rate);
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn frame_period(&self) -> Option<Duration> {
        self.frame_rate.map(CallRate::period)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_rate: Some(CallRate::default()),
            max_ticks: 0,
            frame_samples: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: SchedulerConfig = serde_json::from_str(r#"{ "max_ticks": 10 }"#).unwrap();
        assert_eq!(config.max_ticks, 10);
        assert_eq!(config.frame_rate, Some(CallRate::default()));
        assert_eq!(config.frame_samples, 120);
    }

    #[test]
    fn null_frame_rate_means_unpaced() {
        let config: SchedulerConfig = serde_json::from_str(r#"{ "frame_rate": null }"#).unwrap();
        assert_eq!(config, SchedulerConfig::unpaced());
        assert_eq!(config.frame_period(), None);
    }

    #[test]
    fn invalid_frame_rate_is_rejected() {
        assert!(serde_json::from_str::<SchedulerConfig>(r#"{ "frame_rate": 0 }"#).is_err());
    }
}
