// pothole_sim/examples/01_simulated_drive.rs

//! Drives the pothole detector through a synthetic scenario.
//!
//! This example demonstrates how to:
//! 1. Parse the command line and load a scenario TOML file.
//! 2. Feed synthetic IMU and GPS data through the detection core.
//! 3. Summarize the detected events against the scenario's ground truth.
//!
//! To run this example from the workspace root:
//! `cargo run -p pothole_sim --example 01_simulated_drive -- --scenario assets/scenarios/city_drive.toml`
//!
//! Log verbosity follows `RUST_LOG`, e.g. `RUST_LOG=pothole_core=debug`.

use clap::Parser;
use pothole_sim::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pothole_core=info,pothole_sim=info".into()),
        )
        .init();

    let cli = Cli::parse();
    pothole_sim::run(&cli)?;
    Ok(())
}
