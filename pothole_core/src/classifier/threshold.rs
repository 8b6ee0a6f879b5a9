// pothole_core/src/classifier/threshold.rs

use super::{Classifier, ClassifierKind};
use crate::error::{ArtifactError, EvalError};
use crate::features::{FeatureName, FeatureVector};
use crate::types::Confidence;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Lower and upper bound (exclusive, m/s) of the speed band counted as
/// evidence of driving over a pothole.
const DRIVING_SPEED_BAND: (f32, f32) = (5.0, 50.0);

/// Per-feature class statistics extracted from an offline-trained model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStats {
    pub pos_mean: f32,
    pub pos_std: f32,
    pub neg_mean: f32,
    pub neg_std: f32,
    pub threshold: f32,
    pub importance: f32,
}

impl ThresholdStats {
    fn midpoint(&self) -> f32 {
        (self.pos_mean + self.neg_mean) / 2.0
    }
}

/// The bundled classifier configuration artifact (`model_config.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdModelConfig {
    /// Evaluation order.
    pub features: Vec<String>,
    #[serde(default)]
    pub thresholds: HashMap<String, ThresholdStats>,
    #[serde(default)]
    pub decision_weights: HashMap<String, f32>,
}

impl Default for ThresholdModelConfig {
    /// The configuration used when no artifact can be loaded. It carries
    /// decision weights but no statistics, so on its own it yields no evidence.
    fn default() -> Self {
        let decision_weights = [
            (FeatureName::GyroMagnitude, 0.3),
            (FeatureName::AccelMagnitude, 0.2),
            (FeatureName::ZAccelDeviation, 0.2),
            (FeatureName::Speed, 0.1),
            (FeatureName::GyroZ, 0.1),
            (FeatureName::AccelZ, 0.1),
        ]
        .into_iter()
        .map(|(name, weight)| (name.as_str().to_string(), weight))
        .collect();

        Self {
            features: FeatureName::ALL.iter().map(|n| n.as_str().to_string()).collect(),
            thresholds: HashMap::new(),
            decision_weights,
        }
    }
}

impl ThresholdModelConfig {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ThresholdModelConfig =
            serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some((name, weight)) = config
            .decision_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ArtifactError::Malformed {
                path: path.to_path_buf(),
                reason: format!("decision weight for `{name}` must be finite and non-negative, got {weight}"),
            });
        }
        Ok(config)
    }

    /// Loads the artifact at `path`, falling back to [`ThresholdModelConfig::default`]
    /// when there is none or it cannot be read.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::debug!("No threshold configuration given, using built-in defaults");
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => {
                tracing::info!(?path, features = config.features.len(), "Loaded threshold configuration");
                config
            }
            Err(e) => {
                tracing::warn!(error = %e, "Threshold configuration unavailable, using built-in defaults");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WeightedFeature {
    name: FeatureName,
    stats: ThresholdStats,
    weight: f32,
}

/// Weighted-evidence scorer over per-feature class statistics.
///
/// Confidence is the share of decision weight carried by features that show
/// positive evidence. Features listed without statistics do not count.
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    evidence: Vec<WeightedFeature>,
    total_weight: f32,
}

impl ThresholdClassifier {
    pub fn new(config: ThresholdModelConfig) -> Self {
        let mut evidence = Vec::with_capacity(config.features.len());
        for raw_name in &config.features {
            let name = match raw_name.parse::<FeatureName>() {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping feature in threshold configuration");
                    continue;
                }
            };
            let Some(stats) = config.thresholds.get(raw_name) else {
                continue;
            };
            let weight = config.decision_weights.get(raw_name).copied().unwrap_or(0.0);
            evidence.push(WeightedFeature {
                name,
                stats: *stats,
                weight,
            });
        }
        let total_weight = evidence.iter().map(|f| f.weight).sum();
        Self {
            evidence,
            total_weight,
        }
    }

    pub fn total_weight(&self) -> f32 {
        self.total_weight
    }

    /// Weighted share of positive evidence. Exactly zero when no feature
    /// carries weight.
    pub fn confidence(&self, features: &FeatureVector) -> Confidence {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let score: f32 = self
            .evidence
            .iter()
            .filter(|f| is_positive_evidence(f.name, features.get(f.name), &f.stats))
            .map(|f| f.weight)
            .sum();
        score / self.total_weight
    }
}

fn is_positive_evidence(name: FeatureName, value: f32, stats: &ThresholdStats) -> bool {
    match name {
        FeatureName::AccelMagnitude | FeatureName::GyroMagnitude | FeatureName::ZAccelDeviation => {
            value > stats.midpoint()
        }
        FeatureName::Speed => value > DRIVING_SPEED_BAND.0 && value < DRIVING_SPEED_BAND.1,
        _ => (value - stats.pos_mean).abs() < (value - stats.neg_mean).abs(),
    }
}

impl Classifier for ThresholdClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::ThresholdConfig
    }

    fn try_evaluate(&self, features: &FeatureVector) -> Result<Confidence, EvalError> {
        if self.total_weight <= 0.0 {
            return Err(EvalError::NoEvidence);
        }
        Ok(self.confidence(features))
    }
}
