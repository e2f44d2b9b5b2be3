use std::path::Path;
use std::time::Duration;

use eegstim_core::ConditionLabels;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound on trials per condition.
pub const MAX_TRIALS_PER_STATE: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Fullscreen,
    Windowed,
}

/// Immutable run parameters. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub trials_per_state: usize,
    pub max_run: usize,
    pub max_attempts: usize,
    pub active_ms: u64,
    pub iti_range_ms: (u64, u64),
    pub initial_fixation_ms: u64,
    pub end_screen_ms: u64,
    pub start_range: (u32, u32),
    pub decrement_range: (u32, u32),
    pub labels: ConditionLabels,
    pub display: DisplayMode,
    pub seed: Option<u64>,
    pub poll_slice_ms: u64,
    pub show_countdown: bool,
    pub await_start: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            trials_per_state: 50,
            max_run: 5,
            max_attempts: 5000,
            active_ms: 5000,
            iti_range_ms: (1000, 1500),
            initial_fixation_ms: 2000,
            end_screen_ms: 3000,
            start_range: (100, 999),
            decrement_range: (1, 99),
            labels: ConditionLabels::default(),
            display: DisplayMode::default(),
            seed: None,
            poll_slice_ms: 10,
            show_countdown: true,
            await_start: false,
        }
    }
}

impl ExperimentConfig {
    /// Reads a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Rejects every parameter combination that cannot produce a well-formed run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials_per_state == 0 {
            return Err(ConfigError::NoTrials);
        }
        if self.trials_per_state > MAX_TRIALS_PER_STATE {
            return Err(ConfigError::TooManyTrials {
                requested: self.trials_per_state,
                max: MAX_TRIALS_PER_STATE,
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        for (field, value) in [
            ("active duration", self.active_ms),
            ("initial fixation duration", self.initial_fixation_ms),
            ("inter-trial interval minimum", self.iti_range_ms.0),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositiveDuration { field });
            }
        }
        check_range("inter-trial interval", self.iti_range_ms.0, self.iti_range_ms.1)?;
        check_range(
            "start value",
            self.start_range.0.into(),
            self.start_range.1.into(),
        )?;
        check_range(
            "decrement",
            self.decrement_range.0.into(),
            self.decrement_range.1.into(),
        )?;
        if !(1..=10).contains(&self.poll_slice_ms) {
            return Err(ConfigError::PollSlice(self.poll_slice_ms));
        }
        if self.labels.active.trim().is_empty() || self.labels.rest.trim().is_empty() {
            return Err(ConfigError::Labels("labels must not be empty".into()));
        }
        if self.labels.active == self.labels.rest {
            return Err(ConfigError::Labels(format!(
                "active and rest share the label {:?}",
                self.labels.active
            )));
        }
        Ok(())
    }

    pub fn active_duration(&self) -> Duration {
        Duration::from_millis(self.active_ms)
    }

    pub fn initial_fixation(&self) -> Duration {
        Duration::from_millis(self.initial_fixation_ms)
    }

    pub fn end_screen(&self) -> Duration {
        Duration::from_millis(self.end_screen_ms)
    }

    pub fn poll_slice(&self) -> Duration {
        Duration::from_millis(self.poll_slice_ms)
    }
}

fn check_range(field: &'static str, min: u64, max: u64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedRange { field, min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        ExperimentConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_trials_rejected() {
        let config = ExperimentConfig {
            trials_per_state: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoTrials)));
    }

    #[test]
    fn test_trial_count_bounded() {
        let at_cap = ExperimentConfig {
            trials_per_state: MAX_TRIALS_PER_STATE,
            ..Default::default()
        };
        at_cap.validate().unwrap();

        for trials_per_state in [MAX_TRIALS_PER_STATE + 1, usize::MAX / 2 + 1] {
            let config = ExperimentConfig {
                trials_per_state,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::TooManyTrials { requested, .. }) if requested == trials_per_state
            ));
        }
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = ExperimentConfig {
            active_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveDuration {
                field: "active duration"
            })
        ));
    }

    #[test]
    fn test_inverted_iti_rejected() {
        let config = ExperimentConfig {
            iti_range_ms: (2000, 1000),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange {
                min: 2000,
                max: 1000,
                ..
            })
        ));
    }

    #[test]
    fn test_poll_slice_bounded() {
        let config = ExperimentConfig {
            poll_slice_ms: 25,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PollSlice(25))));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let config = ExperimentConfig {
            labels: ConditionLabels::new("task", "task"),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Labels(_))));
    }

    #[test]
    fn test_zero_max_run_is_not_a_config_error() {
        let config = ExperimentConfig {
            max_run: 0,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_json_overlays_defaults() {
        let config = ExperimentConfig::from_json(
            r#"{ "trials_per_state": 4, "labels": { "active": "spell", "rest": "meditate" }, "display": "windowed" }"#,
        )
        .unwrap();
        assert_eq!(config.trials_per_state, 4);
        assert_eq!(config.labels.active, "spell");
        assert_eq!(config.display, DisplayMode::Windowed);
        assert_eq!(config.active_ms, 5000);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            ExperimentConfig::from_json("{ trials"),
            Err(ConfigError::Parse(_))
        ));
    }
}
