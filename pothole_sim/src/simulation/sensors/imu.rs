// pothole_sim/src/simulation/sensors/imu.rs

use anyhow::Context;
use nalgebra::Vector3;
use pothole_core::messages::RawAxisSample;
use pothole_core::types::STANDARD_GRAVITY;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

use crate::simulation::config::{ImuConfig, Pothole, Road};
use crate::simulation::core::prng::SimulationRng;

/// Share of the vertical jolt that also shows up on the longitudinal axis.
const LONGITUDINAL_COUPLING: f32 = 0.25;

// =========================================================================
// == IMU Simulator ==
// =========================================================================

/// Synthesizes accelerometer (m/s^2) and gyroscope (rad/s) readings for a
/// vehicle on a road with potholes. The device is mounted level, so gravity
/// reads +g on z.
#[derive(Debug, Clone)]
pub struct ImuSimulator {
    period: Duration,
    accel_noise: [Normal<f32>; 3], // X, Y, Z
    gyro_noise: [Normal<f32>; 3],  // X, Y, Z
    road_vibration: Normal<f32>,
    potholes: Vec<Pothole>,
}

impl ImuSimulator {
    pub fn new(config: &ImuConfig, road: &Road) -> anyhow::Result<Self> {
        let normal = |std: f32, what: &str| {
            Normal::new(0.0, std).with_context(|| format!("invalid {what} std-dev {std}"))
        };
        let [ax, ay, az] = config.accel_noise_stddev;
        let [gx, gy, gz] = config.gyro_noise_stddev;

        tracing::info!(
            "  -> IMU at {:.1} Hz, {} pothole(s) on the course",
            config.rate_hz,
            road.potholes.len()
        );

        Ok(Self {
            period: Duration::from_secs_f64(1.0 / f64::from(config.rate_hz)),
            accel_noise: [
                normal(ax, "accelerometer")?,
                normal(ay, "accelerometer")?,
                normal(az, "accelerometer")?,
            ],
            gyro_noise: [
                normal(gx, "gyroscope")?,
                normal(gy, "gyroscope")?,
                normal(gz, "gyroscope")?,
            ],
            road_vibration: normal(road.roughness_mps2, "road roughness")?,
            potholes: road.potholes.clone(),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Noise-free specific force and angular rate at `t_s` seconds.
    pub fn ground_truth(&self, t_s: f64) -> (Vector3<f32>, Vector3<f32>) {
        let mut accel = Vector3::new(0.0, 0.0, STANDARD_GRAVITY);
        let mut gyro = Vector3::zeros();
        for pothole in &self.potholes {
            let envelope = pothole.envelope(t_s);
            if envelope == 0.0 {
                continue;
            }
            accel.z += pothole.peak_accel_mps2 * envelope;
            accel.x += LONGITUDINAL_COUPLING * pothole.peak_accel_mps2 * envelope;
            gyro.x += pothole.peak_pitch_rate * envelope;
        }
        (accel, gyro)
    }

    /// One noisy accelerometer and gyroscope reading at `t_s` seconds.
    pub fn sample(&self, t_s: f64, rng: &mut SimulationRng) -> (RawAxisSample, RawAxisSample) {
        let (accel, gyro) = self.ground_truth(t_s);
        let timestamp_ns = (t_s * 1e9).round() as i64;

        let vibration = self.road_vibration.sample(&mut rng.0);
        let noisy_accel = Vector3::new(
            accel.x + self.accel_noise[0].sample(&mut rng.0),
            accel.y + self.accel_noise[1].sample(&mut rng.0),
            accel.z + vibration + self.accel_noise[2].sample(&mut rng.0),
        );
        let noisy_gyro = Vector3::new(
            gyro.x + self.gyro_noise[0].sample(&mut rng.0),
            gyro.y + self.gyro_noise[1].sample(&mut rng.0),
            gyro.z + self.gyro_noise[2].sample(&mut rng.0),
        );

        (
            RawAxisSample {
                values: noisy_accel,
                timestamp_ns,
            },
            RawAxisSample {
                values: noisy_gyro,
                timestamp_ns,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn road() -> Road {
        Road {
            roughness_mps2: 0.0,
            potholes: vec![Pothole {
                at_seconds: 2.0,
                peak_accel_mps2: 12.0,
                peak_pitch_rate: 0.8,
                duration_ms: 100.0,
            }],
        }
    }

    #[test]
    fn level_cruise_reads_gravity_on_z() {
        let imu = ImuSimulator::new(&ImuConfig::default(), &road()).unwrap();
        let (accel, gyro) = imu.ground_truth(1.0);
        assert_abs_diff_eq!(accel, Vector3::new(0.0, 0.0, STANDARD_GRAVITY));
        assert_abs_diff_eq!(gyro, Vector3::zeros());
        assert_eq!(imu.period(), Duration::from_millis(10));
    }

    #[test]
    fn pothole_peaks_mid_crossing() {
        let imu = ImuSimulator::new(&ImuConfig::default(), &road()).unwrap();
        let (accel, gyro) = imu.ground_truth(2.05);
        assert_abs_diff_eq!(accel.z, STANDARD_GRAVITY + 12.0, epsilon = 1e-3);
        assert_abs_diff_eq!(accel.x, 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(gyro.x, 0.8, epsilon = 1e-4);

        let (after, _) = imu.ground_truth(2.2);
        assert_abs_diff_eq!(after.z, STANDARD_GRAVITY);
    }

    #[test]
    fn noiseless_sensor_matches_ground_truth() {
        let config = ImuConfig {
            rate_hz: 50.0,
            accel_noise_stddev: [0.0; 3],
            gyro_noise_stddev: [0.0; 3],
        };
        let imu = ImuSimulator::new(&config, &road()).unwrap();
        let mut rng = SimulationRng::new(Some(1));
        let (accel, gyro) = imu.sample(2.05, &mut rng);
        assert_eq!(accel.timestamp_ns, 2_050_000_000);
        assert_abs_diff_eq!(accel.values, imu.ground_truth(2.05).0);
        assert_abs_diff_eq!(gyro.values, imu.ground_truth(2.05).1);
    }

    #[test]
    fn negative_noise_is_rejected() {
        let config = ImuConfig {
            accel_noise_stddev: [-1.0, 0.0, 0.0],
            ..Default::default()
        };
        assert!(ImuSimulator::new(&config, &road()).is_err());
    }
}
