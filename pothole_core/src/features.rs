// pothole_core/src/features.rs

use crate::messages::CombinedSample;
use crate::types::{FeatureArray, FEATURE_COUNT};
use std::str::FromStr;
use thiserror::Error;

/// Nominal z-axis reading of a level, stationary device, in g.
pub const NOMINAL_Z_ACCEL: f32 = 1.0;

/// Every entry of the feature vector, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureName {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
    Speed,
    AccelMagnitude,
    GyroMagnitude,
    ZAccelDeviation,
}

impl FeatureName {
    pub const ALL: [FeatureName; FEATURE_COUNT] = [
        FeatureName::AccelX,
        FeatureName::AccelY,
        FeatureName::AccelZ,
        FeatureName::GyroX,
        FeatureName::GyroY,
        FeatureName::GyroZ,
        FeatureName::Speed,
        FeatureName::AccelMagnitude,
        FeatureName::GyroMagnitude,
        FeatureName::ZAccelDeviation,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The name used by the bundled classifier configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::AccelX => "accelerometerX",
            FeatureName::AccelY => "accelerometerY",
            FeatureName::AccelZ => "accelerometerZ",
            FeatureName::GyroX => "gyroX",
            FeatureName::GyroY => "gyroY",
            FeatureName::GyroZ => "gyroZ",
            FeatureName::Speed => "speed",
            FeatureName::AccelMagnitude => "accelMagnitude",
            FeatureName::GyroMagnitude => "gyroMagnitude",
            FeatureName::ZAccelDeviation => "zAccelDeviation",
        }
    }
}

impl std::fmt::Display for FeatureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature name `{0}`")]
pub struct UnknownFeature(pub String);

impl FromStr for FeatureName {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = match s {
            "accelerometerX" | "accelX" => FeatureName::AccelX,
            "accelerometerY" | "accelY" => FeatureName::AccelY,
            "accelerometerZ" | "accelZ" => FeatureName::AccelZ,
            "gyroX" | "gyroscopeX" => FeatureName::GyroX,
            "gyroY" | "gyroscopeY" => FeatureName::GyroY,
            "gyroZ" | "gyroscopeZ" => FeatureName::GyroZ,
            "speed" => FeatureName::Speed,
            "accelMagnitude" => FeatureName::AccelMagnitude,
            "gyroMagnitude" => FeatureName::GyroMagnitude,
            "zAccelDeviation" => FeatureName::ZAccelDeviation,
            other => return Err(UnknownFeature(other.to_string())),
        };
        Ok(name)
    }
}

/// The fixed-order, 10-entry feature representation of a combined sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(FeatureArray);

impl FeatureVector {
    /// Derives the features of a combined sample. Pure and infallible.
    pub fn from_sample(sample: &CombinedSample) -> Self {
        let accel = sample.accel;
        let gyro = sample.gyro;
        Self(FeatureArray::from([
            accel.x,
            accel.y,
            accel.z,
            gyro.x,
            gyro.y,
            gyro.z,
            sample.speed,
            accel.norm(),
            gyro.norm(),
            (accel.z - NOMINAL_Z_ACCEL).abs(),
        ]))
    }

    pub fn from_array(values: [f32; FEATURE_COUNT]) -> Self {
        Self(FeatureArray::from(values))
    }

    pub fn get(&self, name: FeatureName) -> f32 {
        self.0[name.index()]
    }

    pub fn as_slice(&self) -> &[f32] {
        self.0.as_slice()
    }

    pub fn as_vector(&self) -> &FeatureArray {
        &self.0
    }

    pub fn speed(&self) -> f32 {
        self.get(FeatureName::Speed)
    }

    pub fn accel_magnitude(&self) -> f32 {
        self.get(FeatureName::AccelMagnitude)
    }

    pub fn gyro_magnitude(&self) -> f32 {
        self.get(FeatureName::GyroMagnitude)
    }

    pub fn z_accel_deviation(&self) -> f32 {
        self.get(FeatureName::ZAccelDeviation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Axis3;
    use approx::assert_abs_diff_eq;

    fn sample(accel: Axis3, gyro: Axis3, speed: f32) -> CombinedSample {
        CombinedSample {
            accel,
            gyro,
            latitude: 0.0,
            longitude: 0.0,
            speed,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn features_follow_the_fixed_order() {
        let s = sample(Axis3::new(3.0, 4.0, 12.0), Axis3::new(0.0, 0.3, 0.4), 8.0);
        let f = FeatureVector::from_sample(&s);
        assert_eq!(&f.as_slice()[..7], &[3.0, 4.0, 12.0, 0.0, 0.3, 0.4, 8.0]);
        assert_abs_diff_eq!(f.accel_magnitude(), 13.0, epsilon = 1e-5);
        assert_abs_diff_eq!(f.gyro_magnitude(), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(f.z_accel_deviation(), 11.0, epsilon = 1e-6);
    }

    #[test]
    fn z_deviation_is_absolute() {
        let s = sample(Axis3::new(0.0, 0.0, -0.5), Axis3::zeros(), 0.0);
        let f = FeatureVector::from_sample(&s);
        assert_abs_diff_eq!(f.z_accel_deviation(), 1.5, epsilon = 1e-6);
    }

    #[test]
    fn magnitude_features_are_non_negative() {
        let values = [-50.0f32, -1.0, -1e-3, 0.0, 1e-3, 1.0, 50.0];
        for &x in &values {
            for &y in &values {
                for &z in &values {
                    let v = Axis3::new(x, y, z);
                    let f = FeatureVector::from_sample(&sample(v, -v, 0.0));
                    assert!(f.accel_magnitude() >= 0.0);
                    assert!(f.gyro_magnitude() >= 0.0);
                    assert!(f.z_accel_deviation() >= 0.0);
                }
            }
        }
    }

    #[test]
    fn names_round_trip_and_accept_aliases() {
        for name in FeatureName::ALL {
            assert_eq!(name.as_str().parse::<FeatureName>().unwrap(), name);
        }
        assert_eq!("accelX".parse::<FeatureName>().unwrap(), FeatureName::AccelX);
        let err = "humidity".parse::<FeatureName>().unwrap_err();
        assert_eq!(err, UnknownFeature("humidity".into()));
        assert_eq!(err.to_string(), "unknown feature name `humidity`");
        assert_eq!(FeatureName::ZAccelDeviation.index(), 9);
    }
}
