// pothole_sim/src/simulation/config/structs.rs

use pothole_core::config::DetectorConfig;
use serde::{Deserialize, Serialize};

// =========================================================================
// == Top-Level Scenario ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: Simulation,
    #[serde(default)]
    pub vehicle: Vehicle,
    #[serde(default)]
    pub road: Road,
    #[serde(default)]
    pub sensors: Sensors,
    /// Passed straight to the detection core.
    #[serde(default)]
    pub detector: DetectorConfig,
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Simulation {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Duration of the drive in seconds.
    pub duration_seconds: f32,
    /// How long after a pothole's start an event still counts as detecting it.
    #[serde(default = "default_match_window_ms")]
    pub match_window_ms: i64,
}

fn default_match_window_ms() -> i64 {
    500
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            duration_seconds: 60.0,
            match_window_ms: default_match_window_ms(),
        }
    }
}

/// A vehicle driving a straight course at constant speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vehicle {
    pub speed_mps: f32,
    pub start_latitude: f64,
    pub start_longitude: f64,
    /// Degrees clockwise from north.
    #[serde(default)]
    pub heading_deg: f64,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            speed_mps: 11.0,
            start_latitude: 19.4326,
            start_longitude: -99.1332,
            heading_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Road {
    /// Std-dev of the vertical road vibration in m/s^2, on top of sensor noise.
    #[serde(default)]
    pub roughness_mps2: f32,
    // The TOML has `[[road.potholes]]`, which becomes a Vec of Pothole structs.
    #[serde(default)]
    pub potholes: Vec<Pothole>,
}

/// One pothole crossing, modelled as a half-sine jolt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pothole {
    /// Seconds after the start of the drive.
    pub at_seconds: f32,
    /// Peak extra vertical acceleration in m/s^2.
    pub peak_accel_mps2: f32,
    /// Peak pitch rate in rad/s.
    #[serde(default)]
    pub peak_pitch_rate: f32,
    #[serde(default = "default_pothole_duration_ms")]
    pub duration_ms: f32,
}

fn default_pothole_duration_ms() -> f32 {
    120.0
}

impl Pothole {
    pub fn start_ms(&self) -> i64 {
        (self.at_seconds * 1000.0).round() as i64
    }

    pub fn end_ms(&self) -> i64 {
        self.start_ms() + self.duration_ms.round() as i64
    }

    /// Half-sine envelope in [0, 1] at `t_s` seconds; zero outside the crossing.
    pub fn envelope(&self, t_s: f64) -> f32 {
        let elapsed = t_s - f64::from(self.at_seconds);
        let duration = f64::from(self.duration_ms) / 1000.0;
        if elapsed < 0.0 || elapsed > duration || duration <= 0.0 {
            return 0.0;
        }
        (std::f64::consts::PI * elapsed / duration).sin() as f32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sensors {
    #[serde(default)]
    pub imu: ImuConfig,
    #[serde(default)]
    pub gps: GpsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImuConfig {
    pub rate_hz: f32,
    /// Accelerometer noise std-dev per axis, m/s^2.
    pub accel_noise_stddev: [f32; 3],
    /// Gyroscope noise std-dev per axis, rad/s.
    pub gyro_noise_stddev: [f32; 3],
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            rate_hz: 100.0,
            accel_noise_stddev: [0.2, 0.2, 0.3],
            gyro_noise_stddev: [0.01, 0.01, 0.01],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub rate_hz: f32,
    /// No fixes are produced before this time, e.g. to model a cold start.
    #[serde(default)]
    pub start_after_seconds: f32,
    /// Horizontal position noise std-dev in meters.
    pub position_noise_m: f64,
    pub speed_noise_mps: f32,
}

fn default_true() -> bool {
    true
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_hz: 1.0,
            start_after_seconds: 0.0,
            position_noise_m: 3.0,
            speed_noise_mps: 0.3,
        }
    }
}
