//! Runtime settings, loaded from an optional JSON file.

use anyhow::{ensure, Context, Result};
use cadence_core::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub scheduler: SchedulerConfig,
    /// Wall-clock seconds before the demo stops itself (0 = until
    /// `scheduler.max_ticks`, or forever).
    pub run_for_secs: f64,
    /// Number of moving entities to spawn.
    pub entities: usize,
    /// Rate of the threaded physics system.
    pub physics_rate_hz: f64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            run_for_secs: 3.0,
            entities: 256,
            physics_rate_hz: 60.0,
        }
    }
}

impl RuntimeSettings {
    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading settings from {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing settings in {}", path.display()))?
            }
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.run_for_secs.is_finite() && self.run_for_secs >= 0.0,
            "run_for_secs must be a non-negative number of seconds, got {}",
            self.run_for_secs
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fill_in_defaults() {
        let settings: RuntimeSettings =
            serde_json::from_str(r#"{ "entities": 4, "scheduler": { "max_ticks": 10 } }"#).unwrap();
        assert_eq!(settings.entities, 4);
        assert_eq!(settings.scheduler.max_ticks, 10);
        assert_eq!(settings.physics_rate_hz, 60.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn negative_durations_are_rejected() {
        let settings = RuntimeSettings {
            run_for_secs: -1.0,
            ..RuntimeSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = RuntimeSettings::load(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(err.to_string().contains("reading settings"));
    }
}
