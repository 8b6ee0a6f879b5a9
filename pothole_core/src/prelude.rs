// pothole_core/src/prelude.rs

// --- Core Abstractions ---
pub use crate::classifier::{Classifier, ClassifierKind, ScoringModel};
pub use crate::error::{ArtifactError, CoreError, EvalError};

// --- Data Structures ---
pub use crate::features::{FeatureName, FeatureVector};
pub use crate::messages::{
    CombinedSample, FilteredAxisSample, LocationFix, PotholeEvent, RawAxisSample, SensorSnapshot,
    Severity,
};
pub use crate::types::{Axis3, Confidence, FEATURE_COUNT};

// --- Pipeline ---
pub use crate::classifier::{
    Classification, ClassifierChain, FixedRuleClassifier, LearnedModelClassifier, LogisticModel,
    ThresholdClassifier, ThresholdModelConfig,
};
pub use crate::config::{ClassifierConfig, DetectorConfig, TickerMode};
pub use crate::detection::{DetectionPolicy, Detector, DetectorStats, SeverityTiers, Tick};
pub use crate::sensors::{AccelUnit, LocationChannel, MotionChannel};
