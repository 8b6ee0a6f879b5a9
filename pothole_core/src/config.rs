// pothole_core/src/config.rs

use crate::classifier::{FixedRuleParams, ScoreRescale};
use crate::detection::{SeverityTiers, DEFAULT_SENSITIVITY_THRESHOLD};
use crate::error::CoreError;
use crate::filters::{validate_coefficient, DEFAULT_FILTER_COEFFICIENT};
use crate::sensors::AccelUnit;
use crate::synchronizer::{period_for_rate, DEFAULT_SAMPLING_RATE_HZ};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =========================================================================
// == Detector Configuration ==
// =========================================================================

/// Everything needed to build a [`crate::detection::Detector`].
/// Every section is optional when deserialized; missing values take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Exponential smoothing coefficient shared by both motion filters, in [0, 1].
    pub filter_coefficient: f32,
    /// Unit delivered by the accelerometer feed.
    pub accel_unit: AccelUnit,
    pub sampling_rate_hz: u32,
    pub sensitivity_threshold: f32,
    pub severity: SeverityTiers,
    pub ticker: TickerMode,
    /// Per-subscriber event buffer. Events for a full subscriber are dropped.
    pub subscriber_capacity: usize,
    pub classifier: ClassifierConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            filter_coefficient: DEFAULT_FILTER_COEFFICIENT,
            accel_unit: AccelUnit::default(),
            sampling_rate_hz: DEFAULT_SAMPLING_RATE_HZ,
            sensitivity_threshold: DEFAULT_SENSITIVITY_THRESHOLD,
            severity: SeverityTiers::default(),
            ticker: TickerMode::default(),
            subscriber_capacity: 256,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_coefficient(self.filter_coefficient)?;
        period_for_rate(self.sampling_rate_hz)?;
        self.severity.validate()?;
        if !(0.0..=1.0).contains(&self.sensitivity_threshold) {
            return Err(CoreError::invalid(
                "sensitivity_threshold",
                format!("must be within [0, 1], got {}", self.sensitivity_threshold),
            ));
        }
        if self.subscriber_capacity == 0 {
            return Err(CoreError::invalid(
                "subscriber_capacity",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Who drives the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickerMode {
    /// A dedicated thread ticks at the configured sampling rate.
    #[default]
    Thread,
    /// The caller ticks via `Detector::step`, e.g. from its own timer or a
    /// simulation clock.
    Manual,
}

/// Artifact locations and tuning for the classifier chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Learned-model artifact. Absent or unreadable means the chain starts
    /// at the threshold configuration.
    pub model_path: Option<PathBuf>,
    /// Threshold configuration artifact. Absent or unreadable means the
    /// built-in default configuration.
    pub threshold_config_path: Option<PathBuf>,
    pub rescale_model_output: bool,
    pub rescale: ScoreRescale,
    pub fixed_rule: FixedRuleParams,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            threshold_config_path: None,
            rescale_model_output: true,
            rescale: ScoreRescale::default(),
            fixed_rule: FixedRuleParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DetectorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.filter_coefficient, 0.8);
        assert_eq!(config.sampling_rate_hz, 50);
        assert_eq!(config.sensitivity_threshold, 0.6);
        assert!(config.classifier.rescale_model_output);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad = [
            DetectorConfig {
                filter_coefficient: 1.2,
                ..Default::default()
            },
            DetectorConfig {
                sampling_rate_hz: 0,
                ..Default::default()
            },
            DetectorConfig {
                sensitivity_threshold: -0.1,
                ..Default::default()
            },
            DetectorConfig {
                subscriber_capacity: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: DetectorConfig = serde_json::from_str(
            r#"{ "sensitivity_threshold": 0.75, "ticker": "manual",
                 "classifier": { "rescale_model_output": false } }"#,
        )
        .unwrap();
        assert_eq!(config.sensitivity_threshold, 0.75);
        assert_eq!(config.ticker, TickerMode::Manual);
        assert!(!config.classifier.rescale_model_output);
        assert_eq!(config.filter_coefficient, 0.8);

        assert!(serde_json::from_str::<DetectorConfig>(r#"{ "alpha": 0.5 }"#).is_err());
    }
}
