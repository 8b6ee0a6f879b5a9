// pothole_core/src/lib.rs

// Pipeline stages, leaves first:
// sensors/filters -> synchronizer -> features -> classifier -> detection.
pub mod classifier;
pub mod config;
pub mod detection;
pub mod error;
pub mod features;
pub mod filters;
pub mod messages;
pub mod prelude;
pub mod sensors;
pub mod synchronizer;
pub mod types;
