// pothole_core/src/detection/mod.rs

//! The detection policy and the Idle/Active detector that drives the pipeline.

mod detector;
mod policy;

pub use detector::{Detector, DetectorStats, Tick};
pub use policy::{DetectionPolicy, SeverityTiers, DEFAULT_SENSITIVITY_THRESHOLD};
