// pothole_sim/src/prelude.rs

// Re-export the entire pothole_core prelude so you can easily access
// detector types like `Detector`, `PotholeEvent`, `DetectorConfig`, etc.
pub use pothole_core::prelude::*;

// Re-export common simulation-specific types.
pub use crate::cli::Cli;
pub use crate::simulation::config::structs::*;
pub use crate::simulation::config::{load_scenario, parse_scenario};
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::runner::{RunMode, RunReport, SimulationRunner};
pub use crate::simulation::sensors::{GpsSimulator, ImuSimulator};
