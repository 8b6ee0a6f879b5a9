// pothole_core/src/messages.rs

use crate::types::Axis3;
use serde::{Deserialize, Serialize};

// =========================================================================
// == Sensor Input Data Structures ==
// =========================================================================

/// One instantaneous 3-axis reading as delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawAxisSample {
    pub values: Axis3,
    /// Monotonic sensor timestamp in nanoseconds.
    pub timestamp_ns: i64,
}

impl RawAxisSample {
    pub fn new(x: f32, y: f32, z: f32, timestamp_ns: i64) -> Self {
        Self {
            values: Axis3::new(x, y, z),
            timestamp_ns,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// The output of a 3-axis signal filter. Same shape as the raw sample;
/// only the latest one is ever retained.
pub type FilteredAxisSample = RawAxisSample;

/// A device-provided location fix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above the WGS84 ellipsoid.
    pub altitude: f64,
    /// Meters per second.
    pub speed: f32,
    /// Estimated horizontal accuracy in meters.
    pub accuracy: f32,
    /// Degrees, 0-360.
    pub bearing: f32,
    /// Wall-clock milliseconds.
    pub timestamp_ms: i64,
}

// =========================================================================
// == Synchronized Sample ==
// =========================================================================

/// A snapshot merging the latest filtered motion vectors with the latest fix.
/// Location fields are zero when no fix has been received yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedSample {
    pub accel: Axis3,
    pub gyro: Axis3,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f32,
    /// Wall-clock milliseconds taken at snapshot time.
    pub timestamp_ms: i64,
}

impl CombinedSample {
    pub fn new(
        accel: &FilteredAxisSample,
        gyro: &FilteredAxisSample,
        location: Option<&LocationFix>,
        timestamp_ms: i64,
    ) -> Self {
        let (latitude, longitude, speed) = location
            .map(|fix| (fix.latitude, fix.longitude, fix.speed))
            .unwrap_or((0.0, 0.0, 0.0));
        Self {
            accel: accel.values,
            gyro: gyro.values,
            latitude,
            longitude,
            speed,
            timestamp_ms,
        }
    }
}

// =========================================================================
// == Detection Output ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        })
    }
}

/// The sensor readings that triggered a detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub accel: Axis3,
    pub gyro: Axis3,
    pub speed: f32,
}

/// A classified pothole detection, handed to the caller for persistence or display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotholeEvent {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
    pub severity: Severity,
    pub confidence: f32,
    pub snapshot: SensorSnapshot,
}

impl PotholeEvent {
    pub fn from_sample(sample: &CombinedSample, severity: Severity, confidence: f32) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp_ms: sample.timestamp_ms,
            severity,
            confidence,
            snapshot: SensorSnapshot {
                accel: sample.accel,
                gyro: sample.gyro,
                speed: sample.speed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_sample_zero_fills_missing_location() {
        let accel = RawAxisSample::new(0.0, 0.0, 1.0, 10);
        let gyro = RawAxisSample::new(0.1, 0.0, 0.0, 12);
        let sample = CombinedSample::new(&accel, &gyro, None, 1_000);

        assert_eq!(sample.latitude, 0.0);
        assert_eq!(sample.longitude, 0.0);
        assert_eq!(sample.speed, 0.0);
        assert_eq!(sample.accel, accel.values);
        assert_eq!(sample.gyro, gyro.values);
        assert_eq!(sample.timestamp_ms, 1_000);
    }

    #[test]
    fn combined_sample_copies_location_fields() {
        let accel = RawAxisSample::new(0.0, 0.0, 1.0, 10);
        let gyro = RawAxisSample::new(0.0, 0.0, 0.0, 12);
        let fix = LocationFix {
            latitude: 40.4168,
            longitude: -3.7038,
            speed: 12.5,
            ..Default::default()
        };
        let sample = CombinedSample::new(&accel, &gyro, Some(&fix), 5);

        assert_eq!(sample.latitude, 40.4168);
        assert_eq!(sample.longitude, -3.7038);
        assert_eq!(sample.speed, 12.5);
    }

    #[test]
    fn severity_orders_low_to_high() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::High.to_string(), "HIGH");
    }
}
