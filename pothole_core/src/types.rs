// pothole_core/src/types.rs

use nalgebra::{SVector, Vector3};
use std::time::{SystemTime, UNIX_EPOCH};

// --- Core Type Aliases ---
/// A 3-axis reading (accelerometer in g, gyroscope in rad/s).
pub type Axis3 = Vector3<f32>;

/// Number of entries in a feature vector.
pub const FEATURE_COUNT: usize = 10;
pub type FeatureArray = SVector<f32, FEATURE_COUNT>;

/// Classifier certainty that a sample is a pothole, always within [0, 1].
pub type Confidence = f32;

/// Standard gravity in m/s^2, used to normalize accelerometer feeds into g.
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Identifies which motion sensor a channel or sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionSource {
    Accelerometer,
    Gyroscope,
}

impl MotionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionSource::Accelerometer => "accelerometer",
            MotionSource::Gyroscope => "gyroscope",
        }
    }
}
