// pothole_sim/src/simulation/config/mod.rs

//! Loading and validating the scenario configuration from disk.

pub mod structs;

use anyhow::{ensure, Context};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

pub use structs::*;

/// Environment variables with this prefix override scenario values,
/// e.g. `POTHOLE_DETECTOR__SENSITIVITY_THRESHOLD=0.75`.
pub const ENV_PREFIX: &str = "POTHOLE_";

/// Loads a scenario file, applies environment overrides, resolves artifact
/// paths relative to the scenario file and validates the result.
pub fn load_scenario(path: &Path) -> anyhow::Result<ScenarioConfig> {
    ensure!(path.is_file(), "scenario file {path:?} does not exist");
    tracing::info!("Loading scenario from: {}", path.display());

    let mut scenario: ScenarioConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .with_context(|| format!("failed to parse scenario file {path:?}"))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_artifact_paths(&mut scenario, base);
    validate(&scenario)?;
    Ok(scenario)
}

/// Parses a scenario from TOML text. Relative artifact paths are left as-is.
pub fn parse_scenario(toml: &str) -> anyhow::Result<ScenarioConfig> {
    let scenario: ScenarioConfig = Figment::new()
        .merge(Toml::string(toml))
        .extract()
        .context("failed to parse scenario")?;
    validate(&scenario)?;
    Ok(scenario)
}

fn resolve_artifact_paths(scenario: &mut ScenarioConfig, base: &Path) {
    let classifier = &mut scenario.detector.classifier;
    for path in [
        &mut classifier.model_path,
        &mut classifier.threshold_config_path,
    ]
    .into_iter()
    .flatten()
    {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }
}

pub fn validate(scenario: &ScenarioConfig) -> anyhow::Result<()> {
    scenario
        .detector
        .validate()
        .context("invalid [detector] section")?;

    let sim = &scenario.simulation;
    ensure!(
        sim.duration_seconds.is_finite() && sim.duration_seconds > 0.0,
        "simulation.duration_seconds must be positive"
    );
    ensure!(sim.match_window_ms >= 0, "simulation.match_window_ms must not be negative");
    ensure!(
        scenario.vehicle.speed_mps.is_finite() && scenario.vehicle.speed_mps >= 0.0,
        "vehicle.speed_mps must not be negative"
    );
    ensure!(
        scenario.sensors.imu.rate_hz > 0.0,
        "sensors.imu.rate_hz must be positive"
    );
    ensure!(
        !scenario.sensors.gps.enabled || scenario.sensors.gps.rate_hz > 0.0,
        "sensors.gps.rate_hz must be positive when the GPS is enabled"
    );
    for (i, pothole) in scenario.road.potholes.iter().enumerate() {
        ensure!(
            pothole.at_seconds >= 0.0 && pothole.duration_ms > 0.0,
            "road.potholes[{i}] must start at or after 0 s and last longer than 0 ms"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pothole_core::config::TickerMode;
    use std::path::PathBuf;

    const SCENARIO: &str = r#"
        [simulation]
        seed = 7
        duration_seconds = 12.5

        [vehicle]
        speed_mps = 9.0
        start_latitude = 40.0
        start_longitude = -3.0

        [[road.potholes]]
        at_seconds = 3.0
        peak_accel_mps2 = 14.0
        peak_pitch_rate = 0.5

        [sensors.gps]
        enabled = false
        rate_hz = 1.0
        position_noise_m = 2.0
        speed_noise_mps = 0.1

        [detector]
        accel_unit = "meters_per_second_squared"
        ticker = "manual"
        sensitivity_threshold = 0.75
    "#;

    #[test]
    fn parses_a_scenario_and_fills_defaults() {
        let scenario = parse_scenario(SCENARIO).unwrap();
        assert_eq!(scenario.simulation.seed, Some(7));
        assert_eq!(scenario.simulation.match_window_ms, 500);
        assert_eq!(scenario.road.potholes.len(), 1);
        assert_eq!(scenario.road.potholes[0].duration_ms, 120.0);
        assert!(!scenario.sensors.gps.enabled);
        assert_eq!(scenario.sensors.imu, ImuConfig::default());
        assert_eq!(scenario.detector.ticker, TickerMode::Manual);
        assert_eq!(scenario.detector.sensitivity_threshold, 0.75);
        assert_eq!(scenario.detector.filter_coefficient, 0.8);
    }

    #[test]
    fn unknown_fields_and_bad_values_are_rejected() {
        assert!(parse_scenario("[vehicle]\nspeed_mps = 3.0\nstart_latitude = 0.0\nstart_longitude = 0.0\nwings = 2").is_err());
        assert!(parse_scenario("[detector]\nfilter_coefficient = 1.5").is_err());
        assert!(parse_scenario("[simulation]\nduration_seconds = 0.0").is_err());
    }

    #[test]
    fn relative_artifact_paths_follow_the_scenario_file() {
        let mut scenario = ScenarioConfig::default();
        scenario.detector.classifier.model_path = Some("../models/m.json".into());
        scenario.detector.classifier.threshold_config_path = Some("/abs/c.json".into());
        resolve_artifact_paths(&mut scenario, Path::new("assets/scenarios"));
        assert_eq!(
            scenario.detector.classifier.model_path,
            Some(PathBuf::from("assets/scenarios/../models/m.json"))
        );
        assert_eq!(
            scenario.detector.classifier.threshold_config_path,
            Some(PathBuf::from("/abs/c.json"))
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_scenario(Path::new("/no/such/scenario.toml")).is_err());
    }
}
