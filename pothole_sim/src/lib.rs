// pothole_sim/src/lib.rs

// This prelude is for convenience for other files WITHIN the pothole_sim crate.
pub mod prelude;

// Command-line interface shared by the binaries.
pub mod cli;
// Scenario loading, synthetic sensors and the run loop.
pub mod simulation;

use crate::cli::Cli;
use crate::simulation::config::load_scenario;
use crate::simulation::runner::{RunReport, SimulationRunner};

/// Loads the scenario named on the command line, applies overrides and runs it.
pub fn run(cli: &Cli) -> anyhow::Result<RunReport> {
    let mut scenario = load_scenario(&cli.scenario)?;
    cli.apply_overrides(&mut scenario);
    simulation::config::validate(&scenario)?;

    let mut runner = SimulationRunner::new(scenario)?;
    let report = runner.run(cli.mode())?;
    report.log_summary();
    Ok(report)
}
