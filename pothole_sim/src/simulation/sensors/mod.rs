// pothole_sim/src/simulation/sensors/mod.rs

//! Synthetic sensor feeds for a vehicle driving over potholes.

mod gps;
mod imu;

pub use gps::GpsSimulator;
pub use imu::ImuSimulator;
