// pothole_core/src/classifier/learned.rs

use super::{Classifier, ClassifierKind};
use crate::error::{ArtifactError, EvalError};
use crate::features::FeatureVector;
use crate::types::{Confidence, FEATURE_COUNT};
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;

// --- SCORING MODEL TRAIT ---
/// An opaque, pre-trained scorer: ten features in, one raw score out.
/// Implement this to plug in any inference runtime.
pub trait ScoringModel: DynClone + Debug + Send + Sync {
    fn score(&self, features: &[f32]) -> Result<f32, EvalError>;
}

dyn_clone::clone_trait_object!(ScoringModel);

/// Piecewise-linear remap applied to raw model scores, whose distribution is
/// poorly calibrated. With the defaults:
///
/// * raw > 0.1 maps linearly from 0.7 at 0.1 to 0.9 at 0.3, and keeps rising past it;
/// * 0.01 < raw <= 0.1 maps linearly onto 0.5..0.7;
/// * raw <= 0.01 is multiplied by 10.
///
/// The result is clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreRescale {
    /// Raw scores above this use the upper segment.
    pub upper_knee: f32,
    /// Raw-score width over which the upper segment rises by `upper_rise`.
    pub upper_span: f32,
    pub upper_base: f32,
    pub upper_rise: f32,
    /// Raw scores above this (and up to `upper_knee`) use the middle segment.
    pub lower_knee: f32,
    pub lower_base: f32,
    pub lower_rise: f32,
    /// Gain applied to raw scores at or below `lower_knee`.
    pub low_gain: f32,
}

impl Default for ScoreRescale {
    fn default() -> Self {
        Self {
            upper_knee: 0.1,
            upper_span: 0.2,
            upper_base: 0.7,
            upper_rise: 0.2,
            lower_knee: 0.01,
            lower_base: 0.5,
            lower_rise: 0.2,
            low_gain: 10.0,
        }
    }
}

impl ScoreRescale {
    pub fn apply(&self, raw: f32) -> Confidence {
        let scaled = if raw > self.upper_knee {
            self.upper_base + ((raw - self.upper_knee) / self.upper_span) * self.upper_rise
        } else if raw > self.lower_knee {
            let width = self.upper_knee - self.lower_knee;
            self.lower_base + ((raw - self.lower_knee) / width) * self.lower_rise
        } else {
            raw * self.low_gain
        };
        scaled.clamp(0.0, 1.0)
    }
}

/// The bundled learned-model artifact: a logistic scorer over (optionally
/// standardized) features, stored as JSON.
///
/// ```json
/// { "weights": [..10 floats..], "bias": -2.1,
///   "feature_means": [..10..], "feature_scales": [..10..] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogisticModel {
    pub weights: Vec<f32>,
    pub bias: f32,
    #[serde(default)]
    pub feature_means: Option<Vec<f32>>,
    #[serde(default)]
    pub feature_scales: Option<Vec<f32>>,
}

impl LogisticModel {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self {
            weights,
            bias,
            feature_means: None,
            feature_scales: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: LogisticModel =
            serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate().map_err(|reason| ArtifactError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        if self.weights.len() != FEATURE_COUNT {
            return Err(format!(
                "expected {FEATURE_COUNT} weights, found {}",
                self.weights.len()
            ));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err("weights and bias must be finite".to_string());
        }
        if let Some(means) = &self.feature_means {
            if means.len() != FEATURE_COUNT || means.iter().any(|m| !m.is_finite()) {
                return Err(format!("feature_means must hold {FEATURE_COUNT} finite values"));
            }
        }
        if let Some(scales) = &self.feature_scales {
            if scales.len() != FEATURE_COUNT || scales.iter().any(|s| !s.is_finite() || *s <= 0.0)
            {
                return Err(format!(
                    "feature_scales must hold {FEATURE_COUNT} positive values"
                ));
            }
        }
        Ok(())
    }
}

impl ScoringModel for LogisticModel {
    fn score(&self, features: &[f32]) -> Result<f32, EvalError> {
        if features.len() != self.weights.len() {
            return Err(EvalError::DimensionMismatch {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }

        for stats in [&self.feature_means, &self.feature_scales].into_iter().flatten() {
            if stats.len() != self.weights.len() {
                return Err(EvalError::DimensionMismatch {
                    expected: self.weights.len(),
                    actual: stats.len(),
                });
            }
        }

        let mut z = self.bias;
        for (i, (&x, &w)) in features.iter().zip(&self.weights).enumerate() {
            let mean = self.feature_means.as_ref().map_or(0.0, |m| m[i]);
            let scale = self.feature_scales.as_ref().map_or(1.0, |s| s[i]);
            z += w * (x - mean) / scale;
        }
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

/// Classifier backed by a learned scoring model, optionally rescaled.
#[derive(Debug, Clone)]
pub struct LearnedModelClassifier {
    model: Box<dyn ScoringModel>,
    rescale: Option<ScoreRescale>,
}

impl LearnedModelClassifier {
    pub fn new(model: Box<dyn ScoringModel>, rescale: Option<ScoreRescale>) -> Self {
        Self { model, rescale }
    }
}

impl Classifier for LearnedModelClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::LearnedModel
    }

    fn try_evaluate(&self, features: &FeatureVector) -> Result<Confidence, EvalError> {
        let raw = self.model.score(features.as_slice())?;
        if !raw.is_finite() {
            return Err(EvalError::NonFinite(raw));
        }
        Ok(match &self.rescale {
            Some(rescale) => rescale.apply(raw),
            None => raw.clamp(0.0, 1.0),
        })
    }
}
