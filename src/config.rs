//! Tunables for scoring and collection. Everything has a default, so a config file only needs the
//! values that differ.

use std::{path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    /// Only read by [crate::activity::passive::PassiveMonitorModule]. The `track` command doesn't
    /// run the passive monitor.
    #[serde(default)]
    pub passive: PassiveConfig,
}

/// Weights and normalization used by the activity aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_keystroke_weight")]
    pub keystroke_weight: f64,
    #[serde(default = "default_click_weight")]
    pub click_weight: f64,
    #[serde(default = "default_movement_weight")]
    pub movement_weight: f64,
    /// Weighted activity units per second that count as fully active.
    #[serde(default = "default_baseline_units_per_second")]
    pub baseline_units_per_second: f64,
    #[serde(default)]
    pub movement: MovementConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            keystroke_weight: default_keystroke_weight(),
            click_weight: default_click_weight(),
            movement_weight: default_movement_weight(),
            baseline_units_per_second: default_baseline_units_per_second(),
            movement: MovementConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Pixels of pointer travel worth one movement point.
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            distance_threshold: default_distance_threshold(),
            max_score: default_max_score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Pointer and click positions kept per session. Older positions are dropped first.
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_positions: default_max_positions(),
        }
    }
}

impl CollectorConfig {
    /// Never zero, a zero interval would make the polling threads spin.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveConfig {
    #[serde(default = "default_sample_interval_secs")]
    pub sample_interval_secs: u64,
    /// Percentage points per interaction per second.
    #[serde(default = "default_passive_scale")]
    pub scale: f64,
}

impl Default for PassiveConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: default_sample_interval_secs(),
            scale: default_passive_scale(),
        }
    }
}

impl PassiveConfig {
    /// At least one second, the sampling ticker can't run with a zero period.
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs.max(1))
    }
}

fn default_keystroke_weight() -> f64 {
    1.0
}

fn default_click_weight() -> f64 {
    0.5
}

fn default_movement_weight() -> f64 {
    0.3
}

fn default_baseline_units_per_second() -> f64 {
    3.0
}

fn default_distance_threshold() -> f64 {
    500.0
}

fn default_max_score() -> f64 {
    10.0
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_max_positions() -> usize {
    1000
}

fn default_sample_interval_secs() -> u64 {
    5
}

fn default_passive_scale() -> f64 {
    10.0
}

impl Config {
    /// Loads a JSON config. Without a path the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path:?}"))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {path:?}"))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {path:?}"))?;
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.collector.poll_interval_ms == 0 {
            bail!("collector.poll_interval_ms must be at least 1");
        }
        if self.passive.sample_interval_secs == 0 {
            bail!("passive.sample_interval_secs must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use anyhow::Result;
    use tempfile::NamedTempFile;

    use super::Config;

    #[test]
    fn defaults_without_path() -> Result<()> {
        let config = Config::load(None)?;
        assert_eq!(config, Config::default());
        assert_eq!(config.scoring.keystroke_weight, 1.0);
        assert_eq!(config.scoring.movement.distance_threshold, 500.0);
        assert_eq!(config.collector.max_positions, 1000);
        assert_eq!(config.passive.sample_interval_secs, 5);
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{ "scoring": {{ "click_weight": 2.0, "movement": {{ "max_score": 4 }} }},
                 "collector": {{ "max_positions": 50 }} }}"#
        )?;

        let config = Config::load(Some(file.path()))?;
        assert_eq!(config.scoring.click_weight, 2.0);
        assert_eq!(config.scoring.keystroke_weight, 1.0);
        assert_eq!(config.scoring.movement.max_score, 4.0);
        assert_eq!(config.scoring.movement.distance_threshold, 500.0);
        assert_eq!(config.collector.max_positions, 50);
        assert_eq!(config.collector.poll_interval_ms, 10);
        Ok(())
    }

    #[test]
    fn zero_intervals_are_rejected() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{ "passive": {{ "sample_interval_secs": 0 }} }}"#)?;
        assert!(Config::load(Some(file.path())).is_err());

        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{ "collector": {{ "poll_interval_ms": 0 }} }}"#)?;
        assert!(Config::load(Some(file.path())).is_err());
        Ok(())
    }

    #[test]
    fn intervals_never_zero() -> Result<()> {
        let config: Config = serde_json::from_str(
            r#"{ "collector": { "poll_interval_ms": 0 },
                 "passive": { "sample_interval_secs": 0 } }"#,
        )?;
        assert_eq!(config.collector.poll_interval(), Duration::from_millis(1));
        assert_eq!(config.passive.sample_interval(), Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{{ not json")?;
        assert!(Config::load(Some(file.path())).is_err());
        Ok(())
    }
}
