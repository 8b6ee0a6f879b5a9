// pothole_sim/src/simulation/sensors/gps.rs

use anyhow::Context;
use pothole_core::messages::LocationFix;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

use crate::simulation::config::{GpsConfig, Vehicle};
use crate::simulation::core::prng::SimulationRng;

/// Meters per degree of latitude (spherical approximation).
const METERS_PER_DEGREE: f64 = 111_320.0;

// =========================================================================
// == GPS Simulator ==
// =========================================================================

/// Synthesizes location fixes for a vehicle driving a straight course at
/// constant speed. Produces nothing while disabled or before its start delay.
#[derive(Debug, Clone)]
pub struct GpsSimulator {
    enabled: bool,
    period: Duration,
    start_after_s: f64,
    vehicle: Vehicle,
    accuracy_m: f32,
    // Store the noise distributions for efficiency
    position_noise: Normal<f64>,
    speed_noise: Normal<f32>,
}

impl GpsSimulator {
    pub fn new(config: &GpsConfig, vehicle: &Vehicle) -> anyhow::Result<Self> {
        if config.enabled {
            tracing::info!(
                "  -> GPS at {:.1} Hz, first fix after {:.1} s",
                config.rate_hz,
                config.start_after_seconds
            );
        } else {
            tracing::info!("  -> GPS disabled, location will be zero-filled");
        }

        let period = if config.enabled {
            Duration::from_secs_f64(1.0 / f64::from(config.rate_hz))
        } else {
            Duration::MAX
        };

        Ok(Self {
            enabled: config.enabled,
            period,
            start_after_s: f64::from(config.start_after_seconds),
            vehicle: vehicle.clone(),
            accuracy_m: config.position_noise_m as f32,
            position_noise: Normal::new(0.0, config.position_noise_m)
                .context("invalid GPS position noise")?,
            speed_noise: Normal::new(0.0, config.speed_noise_mps)
                .context("invalid GPS speed noise")?,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn offset(&self, north_m: f64, east_m: f64) -> (f64, f64) {
        let lat0 = self.vehicle.start_latitude;
        let latitude = lat0 + north_m / METERS_PER_DEGREE;
        let longitude = self.vehicle.start_longitude
            + east_m / (METERS_PER_DEGREE * lat0.to_radians().cos());
        (latitude, longitude)
    }

    /// A noisy fix at `t_s` seconds, or `None` when the receiver has no fix.
    pub fn fix(&self, t_s: f64, rng: &mut SimulationRng) -> Option<LocationFix> {
        if !self.enabled || t_s < self.start_after_s {
            return None;
        }

        let distance = f64::from(self.vehicle.speed_mps) * t_s;
        let heading = self.vehicle.heading_deg.to_radians();
        let north = distance * heading.cos() + self.position_noise.sample(&mut rng.0);
        let east = distance * heading.sin() + self.position_noise.sample(&mut rng.0);
        let (latitude, longitude) = self.offset(north, east);
        let speed = (self.vehicle.speed_mps + self.speed_noise.sample(&mut rng.0)).max(0.0);

        Some(LocationFix {
            latitude,
            longitude,
            altitude: 0.0,
            speed,
            accuracy: self.accuracy_m,
            bearing: self.vehicle.heading_deg.rem_euclid(360.0) as f32,
            timestamp_ms: (t_s * 1000.0).round() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn noiseless(enabled: bool, start_after_seconds: f32) -> GpsConfig {
        GpsConfig {
            enabled,
            rate_hz: 2.0,
            start_after_seconds,
            position_noise_m: 0.0,
            speed_noise_mps: 0.0,
        }
    }

    #[test]
    fn northbound_course_moves_latitude_only() {
        let vehicle = Vehicle {
            speed_mps: 10.0,
            start_latitude: 0.0,
            start_longitude: 0.0,
            heading_deg: 0.0,
        };
        let gps = GpsSimulator::new(&noiseless(true, 0.0), &vehicle).unwrap();
        let mut rng = SimulationRng::new(Some(3));
        let fix = gps.fix(11.132, &mut rng).unwrap();
        assert_abs_diff_eq!(fix.latitude, 0.001, epsilon = 1e-9);
        assert_abs_diff_eq!(fix.longitude, 0.0, epsilon = 1e-9);
        assert_eq!(fix.speed, 10.0);
        assert_eq!(fix.timestamp_ms, 11_132);
        assert_eq!(gps.period(), Duration::from_millis(500));
    }

    #[test]
    fn disabled_or_cold_receiver_has_no_fix() {
        let vehicle = Vehicle::default();
        let mut rng = SimulationRng::new(Some(3));

        let off = GpsSimulator::new(&noiseless(false, 0.0), &vehicle).unwrap();
        assert!(off.fix(10.0, &mut rng).is_none());
        assert!(!off.is_enabled());

        let cold = GpsSimulator::new(&noiseless(true, 5.0), &vehicle).unwrap();
        assert!(cold.fix(4.9, &mut rng).is_none());
        assert!(cold.fix(5.0, &mut rng).is_some());
    }

    #[test]
    fn speed_noise_never_goes_negative() {
        let config = GpsConfig {
            speed_noise_mps: 5.0,
            ..noiseless(true, 0.0)
        };
        let vehicle = Vehicle {
            speed_mps: 0.5,
            ..Vehicle::default()
        };
        let gps = GpsSimulator::new(&config, &vehicle).unwrap();
        let mut rng = SimulationRng::new(Some(11));
        for i in 0..200 {
            let fix = gps.fix(f64::from(i), &mut rng).unwrap();
            assert!(fix.speed >= 0.0);
        }
    }
}
