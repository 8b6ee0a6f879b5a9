// pothole_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

use crate::simulation::config::ScenarioConfig;
use crate::simulation::runner::RunMode;

/// Pothole Sim: drives the pothole detection core with a synthetic drive.
///
/// This struct defines the command-line arguments that can be passed to any
/// binary application that uses the simulation library.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/city_drive.toml")]
    pub scenario: PathBuf,

    /// Overrides the scenario's PRNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Overrides the scenario's duration, in seconds.
    #[arg(long)]
    pub duration: Option<f32>,

    /// Run in wall-clock time on the detector's own thread instead of the
    /// deterministic stepped clock.
    #[arg(long, default_value_t = false)]
    pub realtime: bool,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.realtime {
            RunMode::Realtime
        } else {
            RunMode::Stepped
        }
    }

    /// Applies command-line overrides on top of a loaded scenario.
    pub fn apply_overrides(&self, scenario: &mut ScenarioConfig) {
        if let Some(seed) = self.seed {
            scenario.simulation.seed = Some(seed);
        }
        if let Some(duration) = self.duration {
            scenario.simulation.duration_seconds = duration;
        }
    }
}
