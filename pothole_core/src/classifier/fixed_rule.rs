// pothole_core/src/classifier/fixed_rule.rs

use super::{Classifier, ClassifierKind};
use crate::error::EvalError;
use crate::features::{FeatureName, FeatureVector};
use crate::types::{Confidence, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Thresholds and score increments of the fixed-rule scorer.
/// Acceleration values are in g, gyroscope in rad/s, speed in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixedRuleParams {
    pub accel_magnitude_above: f32,
    pub accel_magnitude_score: f32,
    pub gyro_magnitude_above: f32,
    pub gyro_magnitude_score: f32,
    pub z_deviation_above: f32,
    pub z_deviation_score: f32,
    pub speed_above: f32,
    pub speed_score: f32,
}

impl Default for FixedRuleParams {
    fn default() -> Self {
        Self {
            accel_magnitude_above: 1.5,
            accel_magnitude_score: 0.3,
            gyro_magnitude_above: 0.3,
            gyro_magnitude_score: 0.3,
            z_deviation_above: 0.5,
            z_deviation_score: 0.2,
            speed_above: 5.0,
            speed_score: 0.2,
        }
    }
}

/// Last-resort scorer used when no configuration-backed classifier answers.
/// Purely additive over independent threshold checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRuleClassifier {
    params: FixedRuleParams,
}

impl FixedRuleClassifier {
    pub fn new(params: FixedRuleParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FixedRuleParams {
        &self.params
    }

    /// Scores a raw feature slice. Fewer than ten features is not an error;
    /// it simply scores zero.
    pub fn score(&self, features: &[f32]) -> Confidence {
        if features.len() < FEATURE_COUNT {
            return 0.0;
        }
        let p = &self.params;
        let accel_magnitude = features[FeatureName::AccelMagnitude.index()];
        let gyro_magnitude = features[FeatureName::GyroMagnitude.index()];
        let z_deviation = features[FeatureName::ZAccelDeviation.index()];
        let speed = features[FeatureName::Speed.index()];

        let mut score = 0.0f32;
        if accel_magnitude > p.accel_magnitude_above {
            score += p.accel_magnitude_score;
        }
        if gyro_magnitude > p.gyro_magnitude_above {
            score += p.gyro_magnitude_score;
        }
        if z_deviation > p.z_deviation_above {
            score += p.z_deviation_score;
        }
        if speed > p.speed_above {
            score += p.speed_score;
        }
        score.clamp(0.0, 1.0)
    }
}

impl Classifier for FixedRuleClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::FixedRule
    }

    fn try_evaluate(&self, features: &FeatureVector) -> Result<Confidence, EvalError> {
        Ok(self.score(features.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(accel_mag: f32, gyro_mag: f32, z_dev: f32, speed: f32) -> Vec<f32> {
        vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, speed, accel_mag, gyro_mag, z_dev]
    }

    #[test]
    fn each_rule_adds_its_increment() {
        let c = FixedRuleClassifier::default();
        assert_eq!(c.score(&features(0.0, 0.0, 0.0, 0.0)), 0.0);
        assert_eq!(c.score(&features(1.6, 0.0, 0.0, 0.0)), 0.3);
        assert_eq!(c.score(&features(0.0, 0.31, 0.0, 0.0)), 0.3);
        assert_eq!(c.score(&features(0.0, 0.0, 0.6, 0.0)), 0.2);
        assert_eq!(c.score(&features(0.0, 0.0, 0.0, 5.1)), 0.2);
    }

    #[test]
    fn thresholds_are_strict() {
        let c = FixedRuleClassifier::default();
        assert_eq!(c.score(&features(1.5, 0.3, 0.5, 5.0)), 0.0);
    }

    #[test]
    fn all_rules_saturate_at_one() {
        let c = FixedRuleClassifier::default();
        let score = c.score(&features(9.0, 2.0, 3.0, 20.0));
        assert!(score <= 1.0);
        assert!(score > 0.99);
    }

    #[test]
    fn short_input_scores_zero() {
        let c = FixedRuleClassifier::default();
        assert_eq!(c.score(&[]), 0.0);
        assert_eq!(c.score(&[9.0; 9]), 0.0);
    }

    #[test]
    fn scoring_is_deterministic_and_bounded() {
        let c = FixedRuleClassifier::default();
        let grid = [-10.0f32, 0.0, 0.4, 1.0, 1.6, 6.0, 60.0];
        for &a in &grid {
            for &g in &grid {
                for &z in &grid {
                    for &s in &grid {
                        let f = features(a, g, z, s);
                        let first = c.score(&f);
                        assert_eq!(first, c.score(&f));
                        assert!((0.0..=1.0).contains(&first));
                    }
                }
            }
        }
    }

    #[test]
    fn oversized_increments_are_clamped() {
        let c = FixedRuleClassifier::new(FixedRuleParams {
            accel_magnitude_score: 0.9,
            gyro_magnitude_score: 0.9,
            ..Default::default()
        });
        assert_eq!(c.score(&features(2.0, 1.0, 0.0, 0.0)), 1.0);
    }
}
