// pothole_core/src/detection/policy.rs

use crate::error::CoreError;
use crate::messages::{CombinedSample, PotholeEvent, Severity};
use crate::types::Confidence;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SENSITIVITY_THRESHOLD: f32 = 0.6;

fn validate_unit_interval(name: &'static str, value: f32) -> Result<f32, CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CoreError::invalid(
            name,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

/// Confidence cutoffs for the severity tiers. Both comparisons are strict:
/// a confidence of exactly `medium` is LOW, exactly `high` is MEDIUM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityTiers {
    pub medium: f32,
    pub high: f32,
}

impl Default for SeverityTiers {
    fn default() -> Self {
        Self {
            medium: 0.70,
            high: 0.85,
        }
    }
}

impl SeverityTiers {
    pub fn new(medium: f32, high: f32) -> Result<Self, CoreError> {
        let tiers = Self { medium, high };
        tiers.validate()?;
        Ok(tiers)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_unit_interval("medium", self.medium)?;
        validate_unit_interval("high", self.high)?;
        if self.medium > self.high {
            return Err(CoreError::invalid(
                "medium",
                format!(
                    "medium cutoff {} must not exceed high cutoff {}",
                    self.medium, self.high
                ),
            ));
        }
        Ok(())
    }

    pub fn classify(&self, confidence: Confidence) -> Severity {
        if confidence > self.high {
            Severity::High
        } else if confidence > self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Turns a classified sample into at most one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionPolicy {
    sensitivity_threshold: f32,
    tiers: SeverityTiers,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            sensitivity_threshold: DEFAULT_SENSITIVITY_THRESHOLD,
            tiers: SeverityTiers::default(),
        }
    }
}

impl DetectionPolicy {
    pub fn new(sensitivity_threshold: f32, tiers: SeverityTiers) -> Result<Self, CoreError> {
        tiers.validate()?;
        Ok(Self {
            sensitivity_threshold: validate_unit_interval(
                "sensitivity_threshold",
                sensitivity_threshold,
            )?,
            tiers,
        })
    }

    pub fn sensitivity_threshold(&self) -> f32 {
        self.sensitivity_threshold
    }

    pub fn set_sensitivity_threshold(&mut self, value: f32) -> Result<(), CoreError> {
        self.sensitivity_threshold = validate_unit_interval("sensitivity_threshold", value)?;
        Ok(())
    }

    pub fn tiers(&self) -> SeverityTiers {
        self.tiers
    }

    pub fn set_tiers(&mut self, tiers: SeverityTiers) -> Result<(), CoreError> {
        tiers.validate()?;
        self.tiers = tiers;
        Ok(())
    }

    /// Emits an event only when the confidence is strictly above the
    /// sensitivity threshold.
    pub fn evaluate(&self, sample: &CombinedSample, confidence: Confidence) -> Option<PotholeEvent> {
        if confidence > self.sensitivity_threshold {
            let severity = self.tiers.classify(confidence);
            Some(PotholeEvent::from_sample(sample, severity, confidence))
        } else {
            None
        }
    }
}
