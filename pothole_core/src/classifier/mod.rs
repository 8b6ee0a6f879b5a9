// pothole_core/src/classifier/mod.rs

//! Pothole classifiers and the fallback chain that orders them.
//!
//! Every variant implements [`Classifier`]. The [`ClassifierChain`] tries them in
//! order and takes the first confidence it gets; a variant that cannot answer
//! (missing artifact, inference failure, no usable evidence) simply hands over
//! to the next one. The chain always ends with the fixed-rule scorer, so it
//! never fails.

use crate::config::ClassifierConfig;
use crate::error::EvalError;
use crate::features::FeatureVector;
use crate::types::Confidence;
use dyn_clone::DynClone;
use std::fmt::Debug;

mod fixed_rule;
mod learned;
mod threshold;

pub use fixed_rule::{FixedRuleClassifier, FixedRuleParams};
pub use learned::{LearnedModelClassifier, LogisticModel, ScoreRescale, ScoringModel};
pub use threshold::{ThresholdClassifier, ThresholdModelConfig, ThresholdStats};

/// Identifies which variant produced a confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierKind {
    LearnedModel,
    ThresholdConfig,
    FixedRule,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::LearnedModel => "learned_model",
            ClassifierKind::ThresholdConfig => "threshold_config",
            ClassifierKind::FixedRule => "fixed_rule",
        }
    }
}

// --- CLASSIFIER TRAIT ---
/// A scorer mapping a feature vector to a pothole confidence.
pub trait Classifier: DynClone + Debug + Send + Sync {
    fn kind(&self) -> ClassifierKind;

    /// Evaluates the features. An `Err` means "this variant cannot answer",
    /// never "this is not a pothole".
    fn try_evaluate(&self, features: &FeatureVector) -> Result<Confidence, EvalError>;
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn Classifier>`.
dyn_clone::clone_trait_object!(Classifier);

/// The confidence for one feature vector and the variant that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub confidence: Confidence,
    pub kind: ClassifierKind,
}

/// Ordered fallback list of classifiers, terminated by the fixed-rule scorer.
#[derive(Debug, Clone)]
pub struct ClassifierChain {
    variants: Vec<Box<dyn Classifier>>,
    fallback: FixedRuleClassifier,
}

impl Default for ClassifierChain {
    fn default() -> Self {
        Self::fixed_rule_only(FixedRuleParams::default())
    }
}

impl ClassifierChain {
    pub fn new(variants: Vec<Box<dyn Classifier>>, fallback: FixedRuleClassifier) -> Self {
        Self { variants, fallback }
    }

    pub fn fixed_rule_only(params: FixedRuleParams) -> Self {
        Self::new(Vec::new(), FixedRuleClassifier::new(params))
    }

    /// Builds the chain from the bundled artifacts. Artifacts that fail to load
    /// are logged and left out; the chain is always usable.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let mut variants: Vec<Box<dyn Classifier>> = Vec::new();

        if let Some(path) = &config.model_path {
            match LogisticModel::load(path) {
                Ok(model) => {
                    tracing::info!(?path, "Loaded learned pothole model");
                    let rescale = config.rescale_model_output.then_some(config.rescale);
                    variants.push(Box::new(LearnedModelClassifier::new(
                        Box::new(model),
                        rescale,
                    )));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Learned model unavailable, using threshold configuration");
                }
            }
        }

        let thresholds = ThresholdModelConfig::load_or_default(config.threshold_config_path.as_deref());
        variants.push(Box::new(ThresholdClassifier::new(thresholds)));

        Self::new(variants, FixedRuleClassifier::new(config.fixed_rule))
    }

    /// Evaluates the chain. Always returns a confidence within [0, 1].
    pub fn evaluate(&self, features: &FeatureVector) -> Classification {
        for variant in &self.variants {
            match variant.try_evaluate(features) {
                Ok(confidence) if confidence.is_finite() => {
                    return Classification {
                        confidence: confidence.clamp(0.0, 1.0),
                        kind: variant.kind(),
                    };
                }
                Ok(confidence) => {
                    tracing::debug!(
                        classifier = variant.kind().as_str(),
                        confidence,
                        "Discarding non-finite confidence"
                    );
                }
                Err(EvalError::NoEvidence) => {
                    tracing::trace!(classifier = variant.kind().as_str(), "No evidence, falling back");
                }
                Err(e) => {
                    tracing::debug!(classifier = variant.kind().as_str(), error = %e, "Classifier failed, falling back");
                }
            }
        }

        Classification {
            confidence: self.fallback.score(features.as_slice()),
            kind: ClassifierKind::FixedRule,
        }
    }

    /// The variants in evaluation order, including the terminal fixed rule.
    pub fn kinds(&self) -> Vec<ClassifierKind> {
        self.variants
            .iter()
            .map(|v| v.kind())
            .chain(std::iter::once(ClassifierKind::FixedRule))
            .collect()
    }
}
